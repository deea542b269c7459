use thiserror::Error;

/// The complete set of failures a client can observe. Every other failure
/// (programming errors, resource exhaustion) propagates as a transport 5xx
/// and is not part of this contract — see `spec.md` §7.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("authentication invalid")]
    AuthenticationInvalid,
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("request data missing")]
    RequestDataMissing,
    #[error("request data invalid")]
    RequestDataInvalid,
}
