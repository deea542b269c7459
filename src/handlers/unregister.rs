use crate::domain::unix_now_secs;
use crate::error::DirectoryError;
use crate::metrics::{Operation, Outcome};
use crate::state::AppState;
use crate::wire::Request as WireRequest;
use axum::extract::State;
use axum::response::IntoResponse;
use bytes::Bytes;
use std::time::Instant;
use tracing::{debug, warn};

use super::{outcome_for, respond};

/// `POST /user/delete` — `Directory.unregister(user, token)`.
pub async fn delete(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let started = Instant::now();

    if body.is_empty() {
        warn!("delete: empty request body");
        state
            .metrics
            .record(
                Operation::Unregister,
                Outcome::RequestDataMissing,
                started.elapsed().as_millis() as u64,
            )
            .await;
        return respond(Err(DirectoryError::RequestDataMissing));
    }

    let req = match WireRequest::decode_body(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!("delete: malformed request body");
            state
                .metrics
                .record(
                    Operation::Unregister,
                    outcome_for(&e),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            return respond(Err(e));
        }
    };

    let now = unix_now_secs();
    state.directory.sweep(now);
    let result = state
        .directory
        .unregister(&req.user_id(), &req.auth(), now);

    if let Err(ref e) = result {
        warn!("delete: {e}");
        state
            .metrics
            .record(
                Operation::Unregister,
                outcome_for(e),
                started.elapsed().as_millis() as u64,
            )
            .await;
        return respond(Err(*e));
    }

    debug!("delete: user removed from directory");
    state
        .metrics
        .record(
            Operation::Unregister,
            Outcome::Success,
            started.elapsed().as_millis() as u64,
        )
        .await;
    respond(Ok((Vec::new(), Vec::new())))
}
