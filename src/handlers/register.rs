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

/// `POST /user/register` — `Directory.register(user, token)`, always
/// responds `SUCCESS` per `spec.md` §6.
pub async fn register(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let started = Instant::now();

    if body.is_empty() {
        warn!("register: empty request body");
        state
            .metrics
            .record(
                Operation::Register,
                Outcome::RequestDataMissing,
                started.elapsed().as_millis() as u64,
            )
            .await;
        return respond(Err(DirectoryError::RequestDataMissing));
    }

    let req = match WireRequest::decode_body(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!("register: malformed request body");
            state
                .metrics
                .record(
                    Operation::Register,
                    outcome_for(&e),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            return respond(Err(e));
        }
    };

    let now = unix_now_secs();
    state.directory.sweep(now);
    state
        .directory
        .register(req.user_id(), req.auth(), now);

    debug!("register: user added to directory");
    state
        .metrics
        .record(
            Operation::Register,
            Outcome::Success,
            started.elapsed().as_millis() as u64,
        )
        .await;
    respond(Ok((Vec::new(), Vec::new())))
}
