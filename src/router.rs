//! Router assembly, factored out of `main` so integration tests can build
//! the same app the binary serves without going through a real socket.

use crate::config::AppConfig;
use crate::handlers::{discovery, health, metrics, register, test_endpoints, unregister};
use crate::middleware::{api_version::api_version_middleware, security_headers::security_headers_middleware};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/metrics/prometheus",
            get(metrics::prometheus_metrics_handler),
        );

    let protocol_routes = Router::new()
        .route("/user/register", post(register::register))
        .route("/user/delete", post(unregister::delete))
        .route("/discovery/full", post(discovery::full_sync))
        .route("/discovery/incremental", post(discovery::incremental_sync));

    let test_routes = Router::new()
        .route("/reset", get(test_endpoints::reset))
        .route("/test/create/:n", get(test_endpoints::create))
        .route("/test/add/many", post(test_endpoints::add_many));

    Router::new()
        .merge(public_routes)
        .merge(protocol_routes)
        .merge(test_routes)
        .layer(tower_http::limit::RequestBodyLimitLayer::new(
            config.server.max_request_size,
        ))
        .layer(tower_http::compression::CompressionLayer::new())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(api_version_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
