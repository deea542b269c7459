use super::{AuthToken, Identifier};
use std::collections::HashMap;

/// Mapping from user id to auth token. Each identifier appears at most once;
/// presence means "registered"; the stored token is the one bound at the
/// most recent registration.
#[derive(Default)]
pub struct UserSet {
    users: HashMap<Identifier, AuthToken>,
}

impl UserSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. Post-condition: `is_valid(id, token) == true`.
    pub fn add(&mut self, id: Identifier, token: AuthToken) {
        self.users.insert(id, token);
    }

    /// Idempotent when absent.
    pub fn remove(&mut self, id: &Identifier) {
        self.users.remove(id);
    }

    pub fn exists(&self, id: &Identifier) -> bool {
        self.users.contains_key(id)
    }

    pub fn is_valid(&self, id: &Identifier, token: &AuthToken) -> bool {
        self.users.get(id).is_some_and(|stored| stored == token)
    }

    /// Returns the subset of `ids` present in the map, preserving input
    /// order and duplicates. Probes the map once per input rather than
    /// iterating the stored set, so cost is O(|ids|) regardless of how
    /// many users are registered.
    pub fn intersect(&self, ids: &[Identifier]) -> Vec<Identifier> {
        ids.iter()
            .filter(|id| self.users.contains_key(id))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }
}
