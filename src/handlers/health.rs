use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

const CACHE_CONTROL_NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Liveness probe. Reports the directory's container sizes rather than
/// reaching out to anything external — this service has no backends to
/// be unavailable.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.directory.snapshot();

    (
        [(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        )],
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "registered_users": snapshot.registered_users,
            "pending_added": snapshot.pending_added,
            "pending_removed": snapshot.pending_removed,
        })),
    )
}
