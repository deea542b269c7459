//! The request/response envelope, compiled from `proto/icd.proto` via `prost-build`.
//!
//! Wire-compatible with a standard protobuf TLV encoding so existing clients
//! speaking the envelope in `spec.md` §6 can interoperate unmodified.

mod generated {
    include!(concat!(env!("OUT_DIR"), "/icd.rs"));
}

pub use generated::{Request, Response, Result as WireResult};

use crate::domain::Identifier;
use crate::error::DirectoryError;
use bytes::Bytes;
use prost::Message;

impl Request {
    /// Decode a raw request body. Empty bodies are handled by the caller
    /// (`REQUEST_DATA_MISSING` is distinct from a malformed non-empty body).
    pub fn decode_body(data: &[u8]) -> Result<Self, DirectoryError> {
        Request::decode(data).map_err(|_| DirectoryError::RequestDataInvalid)
    }

    pub fn user_id(&self) -> Identifier {
        Identifier::from(Bytes::copy_from_slice(&self.user))
    }

    pub fn auth(&self) -> crate::domain::AuthToken {
        crate::domain::AuthToken::from(Bytes::copy_from_slice(&self.auth_token))
    }

    pub fn contact_ids(&self) -> Vec<Identifier> {
        self.identifiers
            .iter()
            .map(|b| Identifier::from(Bytes::copy_from_slice(b)))
            .collect()
    }
}

impl Response {
    pub fn success(added: Vec<Identifier>, removed: Vec<Identifier>) -> Self {
        Response {
            result: WireResult::Success as i32,
            added_users: added.into_iter().map(|id| id.into_bytes().to_vec()).collect(),
            removed_users: removed.into_iter().map(|id| id.into_bytes().to_vec()).collect(),
        }
    }

    pub fn error(err: &DirectoryError) -> Self {
        Response {
            result: WireResult::from(err) as i32,
            added_users: Vec::new(),
            removed_users: Vec::new(),
        }
    }

    pub fn encode_body(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

impl From<&DirectoryError> for WireResult {
    fn from(err: &DirectoryError) -> Self {
        match err {
            DirectoryError::AuthenticationInvalid => WireResult::AuthenticationInvalid,
            DirectoryError::RateLimitExceeded => WireResult::RateLimitExceeded,
            DirectoryError::RequestDataMissing => WireResult::RequestDataMissing,
            DirectoryError::RequestDataInvalid => WireResult::RequestDataInvalid,
        }
    }
}
