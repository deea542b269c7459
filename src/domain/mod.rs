//! The in-memory directory and rate-limiting engine: `UserSet`, `ExpiringSet`,
//! `LeakyBucket`, composed by `Directory` under a single critical section.

pub mod directory;
pub mod expiring_set;
pub mod leaky_bucket;
pub mod user_set;

pub use directory::{Directory, DirectorySnapshot};
pub use expiring_set::ExpiringSet;
pub use leaky_bucket::LeakyBucket;
pub use user_set::UserSet;

use bytes::Bytes;

/// An opaque, immutable identifier — used for both user ids and contact ids.
/// Equality is byte-equal; order is irrelevant.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Identifier(Bytes);

impl Identifier {
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Identifier {
    fn from(b: Bytes) -> Self {
        Identifier(b)
    }
}

impl From<Vec<u8>> for Identifier {
    fn from(v: Vec<u8>) -> Self {
        Identifier(Bytes::from(v))
    }
}

/// An opaque, caller-chosen authentication token. Compared byte-equal; no
/// hashing or canonicalization is required or performed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AuthToken(Bytes);

impl From<Bytes> for AuthToken {
    fn from(b: Bytes) -> Self {
        AuthToken(b)
    }
}

impl From<Vec<u8>> for AuthToken {
    fn from(v: Vec<u8>) -> Self {
        AuthToken(Bytes::from(v))
    }
}

/// Seconds since the Unix epoch, as an integer. Handlers compute this once
/// per request from the wall clock and thread it through explicitly so that
/// `Directory`'s operations remain pure functions of their inputs — this is
/// what makes the scenarios in `spec.md` §8 reproducible in tests.
pub fn unix_now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
