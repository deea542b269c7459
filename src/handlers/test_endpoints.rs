//! Auxiliary test/debug endpoints from `spec.md` §6 — outside the
//! protocol's error taxonomy; these may return non-200 on bad input.

use crate::domain::{unix_now_secs, AuthToken, Identifier};
use crate::state::AppState;
use crate::wire::{Request as WireRequest, Response as WireResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use rand::RngCore;
use tracing::{debug, warn};

const MAX_SYNTHESIZED_USERS: u64 = 10_000_000;
const RANDOM_ID_LEN: usize = 16;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// `GET /reset` — clears all directory state.
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.directory.clear();
    debug!("reset: directory state cleared");
    (StatusCode::OK, "ok")
}

/// `GET /test/create/{n}` — synthesizes `n` random users.
pub async fn create(
    State(state): State<AppState>,
    Path(n): Path<u64>,
) -> impl IntoResponse {
    if n > MAX_SYNTHESIZED_USERS {
        warn!(n, "test/create: refusing to synthesize more than the cap");
        return (
            StatusCode::BAD_REQUEST,
            format!("n must not exceed {MAX_SYNTHESIZED_USERS}"),
        );
    }

    let now = unix_now_secs();
    for _ in 0..n {
        let user = Identifier::from(random_bytes(RANDOM_ID_LEN));
        let token = AuthToken::from(random_bytes(RANDOM_ID_LEN));
        state.directory.register(user, token, now);
    }

    debug!(n, "test/create: synthesized users");
    (StatusCode::OK, format!("created {n} users"))
}

/// `POST /test/add/many` — adds each identifier in the envelope's
/// `identifiers` field with a freshly generated random token, mirroring
/// `addUsers()`'s protobuf-encoded `Response` body.
pub async fn add_many(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match WireRequest::decode_body(&body) {
        Ok(req) => req,
        Err(_) => {
            warn!("test/add/many: malformed request body");
            return (StatusCode::BAD_REQUEST, "malformed request body").into_response();
        }
    };

    let now = unix_now_secs();
    let ids = req.contact_ids();
    for id in &ids {
        let token = AuthToken::from(random_bytes(RANDOM_ID_LEN));
        state.directory.register(id.clone(), token, now);
    }

    debug!(count = ids.len(), "test/add/many: users added");
    let body = WireResponse::success(ids, Vec::new());
    (StatusCode::OK, body.encode_body()).into_response()
}
