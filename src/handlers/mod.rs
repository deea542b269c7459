pub mod discovery;
pub mod health;
pub mod metrics;
pub mod register;
pub mod test_endpoints;
pub mod unregister;

use crate::error::DirectoryError;
use crate::metrics::Outcome;
use crate::wire::Response as WireResponse;
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;

/// Every one of the four discovery/registration endpoints returns HTTP 200
/// regardless of outcome; failures are carried in the envelope's `result`
/// field, per `spec.md` §7.
pub(crate) fn respond(
    result: Result<(Vec<crate::domain::Identifier>, Vec<crate::domain::Identifier>), DirectoryError>,
) -> Response {
    let body = match result {
        Ok((added, removed)) => WireResponse::success(added, removed),
        Err(ref e) => WireResponse::error(e),
    };
    (StatusCode::OK, body.encode_body()).into_response()
}

pub(crate) fn outcome_for(err: &DirectoryError) -> Outcome {
    match err {
        DirectoryError::AuthenticationInvalid => Outcome::AuthenticationInvalid,
        DirectoryError::RateLimitExceeded => Outcome::RateLimitExceeded,
        DirectoryError::RequestDataMissing => Outcome::RequestDataMissing,
        DirectoryError::RequestDataInvalid => Outcome::RequestDataInvalid,
    }
}
