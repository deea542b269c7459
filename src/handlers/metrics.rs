use crate::metrics::MetricsStats;
use crate::state::AppState;
use axum::{
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};

const CACHE_CONTROL_NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

fn validate_metric_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn format_counter_metric(name: &str, help: &str, value: u64) -> String {
    let validated_name = validate_metric_name(name);
    format!(
        "# HELP {validated_name} {help}\n# TYPE {validated_name} counter\n{validated_name} {value}\n"
    )
}

fn format_gauge_metric(name: &str, help: &str, value: f64) -> String {
    let validated_name = validate_metric_name(name);
    format!(
        "# HELP {validated_name} {help}\n# TYPE {validated_name} gauge\n{validated_name} {value:.2}\n"
    )
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics_data = state.metrics.get_stats().await;
    (
        [(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        )],
        Json(metrics_data),
    )
}

fn build_prometheus_output(stats: &MetricsStats) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str(&format_counter_metric(
        "requests_total",
        "Total number of requests",
        stats.total_requests,
    ));
    out.push_str(&format_counter_metric(
        "requests_failed_total",
        "Total number of failed requests",
        stats.failed_requests,
    ));
    out.push_str(&format_gauge_metric(
        "request_success_rate",
        "Request success rate percentage",
        stats.success_rate,
    ));
    out.push_str(&format_counter_metric(
        "register_requests_total",
        "Total number of register requests",
        stats.register_total,
    ));
    out.push_str(&format_counter_metric(
        "unregister_requests_total",
        "Total number of unregister requests",
        stats.unregister_total,
    ));
    out.push_str(&format_counter_metric(
        "full_sync_requests_total",
        "Total number of full-sync requests",
        stats.full_sync_total,
    ));
    out.push_str(&format_counter_metric(
        "incremental_sync_requests_total",
        "Total number of incremental-sync requests",
        stats.incremental_sync_total,
    ));
    out.push_str(&format_counter_metric(
        "authentication_invalid_total",
        "Total number of AUTHENTICATION_INVALID responses",
        stats.authentication_invalid_total,
    ));
    out.push_str(&format_counter_metric(
        "rate_limit_exceeded_total",
        "Total number of RATE_LIMIT_EXCEEDED responses",
        stats.rate_limit_exceeded_total,
    ));
    out.push_str(&format_counter_metric(
        "request_data_missing_total",
        "Total number of REQUEST_DATA_MISSING responses",
        stats.request_data_missing_total,
    ));
    out.push_str(&format_counter_metric(
        "request_data_invalid_total",
        "Total number of REQUEST_DATA_INVALID responses",
        stats.request_data_invalid_total,
    ));
    out.push_str(&format_gauge_metric(
        "request_latency_ms",
        "Average request latency in milliseconds",
        stats.avg_latency_ms,
    ));
    out.push_str(&format_counter_metric(
        "request_latency_p50_ms",
        "50th percentile request latency in milliseconds",
        stats.p50_latency_ms,
    ));
    out.push_str(&format_counter_metric(
        "request_latency_p95_ms",
        "95th percentile request latency in milliseconds",
        stats.p95_latency_ms,
    ));
    out.push_str(&format_counter_metric(
        "request_latency_p99_ms",
        "99th percentile request latency in milliseconds",
        stats.p99_latency_ms,
    ));

    out
}

fn build_prometheus_response(body: String) -> Result<Response, axum::http::Error> {
    Response::builder()
        .status(200)
        .header(
            "Content-Type",
            HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
        )
        .header(
            "Cache-Control",
            HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        )
        .body(body.into())
}

fn build_error_response() -> Response {
    match Response::builder()
        .status(500)
        .body("Internal server error".into())
    {
        Ok(response) => response,
        Err(build_err) => {
            tracing::error!("Failed to build error response: {}", build_err);
            let mut response = Response::new("Internal server error".into());
            *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

pub async fn prometheus_metrics_handler(State(state): State<AppState>) -> Response {
    let stats = state.metrics.get_stats().await;
    let prom_output = build_prometheus_output(&stats);

    match build_prometheus_response(prom_output) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build Prometheus metrics response: {}", e);
            build_error_response()
        }
    }
}
