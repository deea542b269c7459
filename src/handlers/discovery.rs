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

/// `POST /discovery/full` — returns `added_users = found[]` against the
/// full registered population.
pub async fn full_sync(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let started = Instant::now();

    if body.is_empty() {
        warn!("full_sync: empty request body");
        state
            .metrics
            .record(
                Operation::FullSync,
                Outcome::RequestDataMissing,
                started.elapsed().as_millis() as u64,
            )
            .await;
        return respond(Err(DirectoryError::RequestDataMissing));
    }

    let req = match WireRequest::decode_body(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!("full_sync: malformed request body");
            state
                .metrics
                .record(
                    Operation::FullSync,
                    outcome_for(&e),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            return respond(Err(e));
        }
    };

    let now = unix_now_secs();
    state.directory.sweep(now);
    let contacts = req.contact_ids();
    let result = state
        .directory
        .full_sync(&req.user_id(), &req.auth(), &contacts, now);

    match result {
        Ok(found) => {
            debug!(count = found.len(), "full_sync: intersection computed");
            state
                .metrics
                .record(
                    Operation::FullSync,
                    Outcome::Success,
                    started.elapsed().as_millis() as u64,
                )
                .await;
            respond(Ok((found, Vec::new())))
        }
        Err(e) => {
            warn!("full_sync: {e}");
            state
                .metrics
                .record(
                    Operation::FullSync,
                    outcome_for(&e),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            respond(Err(e))
        }
    }
}

/// `POST /discovery/incremental` — returns `added_users, removed_users`
/// against the last Δ seconds of registration deltas.
pub async fn incremental_sync(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let started = Instant::now();

    if body.is_empty() {
        warn!("incremental_sync: empty request body");
        state
            .metrics
            .record(
                Operation::IncrementalSync,
                Outcome::RequestDataMissing,
                started.elapsed().as_millis() as u64,
            )
            .await;
        return respond(Err(DirectoryError::RequestDataMissing));
    }

    let req = match WireRequest::decode_body(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!("incremental_sync: malformed request body");
            state
                .metrics
                .record(
                    Operation::IncrementalSync,
                    outcome_for(&e),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            return respond(Err(e));
        }
    };

    let now = unix_now_secs();
    state.directory.sweep(now);
    let contacts = req.contact_ids();
    let result =
        state
            .directory
            .incremental_sync(&req.user_id(), &req.auth(), &contacts, now);

    match result {
        Ok((added, removed)) => {
            debug!(
                added = added.len(),
                removed = removed.len(),
                "incremental_sync: deltas computed"
            );
            state
                .metrics
                .record(
                    Operation::IncrementalSync,
                    Outcome::Success,
                    started.elapsed().as_millis() as u64,
                )
                .await;
            respond(Ok((added, removed)))
        }
        Err(e) => {
            warn!("incremental_sync: {e}");
            state
                .metrics
                .record(
                    Operation::IncrementalSync,
                    outcome_for(&e),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            respond(Err(e))
        }
    }
}
