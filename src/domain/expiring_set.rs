use super::Identifier;
use std::collections::HashMap;

/// Mapping from identifier to a deadline (epoch seconds), parameterized by
/// a fixed expiration window Δ. An id is either absent or has exactly one
/// deadline.
pub struct ExpiringSet {
    deadlines: HashMap<Identifier, u64>,
    delta_secs: u64,
}

impl ExpiringSet {
    pub fn new(delta_secs: u64) -> Self {
        Self {
            deadlines: HashMap::new(),
            delta_secs,
        }
    }

    /// Sets the deadline to `now + Δ`, overwriting any previous deadline.
    pub fn add(&mut self, id: Identifier, now: u64) {
        self.deadlines.insert(id, now + self.delta_secs);
    }

    pub fn remove(&mut self, id: &Identifier) {
        self.deadlines.remove(id);
    }

    /// Membership is based purely on key presence; entries whose deadline
    /// has passed but have not yet been swept are still reported present.
    /// Callers must sweep before relying on this for correctness.
    pub fn intersect(&self, ids: &[Identifier]) -> Vec<Identifier> {
        ids.iter()
            .filter(|id| self.deadlines.contains_key(id))
            .cloned()
            .collect()
    }

    /// Removes every entry with `deadline <= now`. Returns the removed count.
    pub fn sweep(&mut self, now: u64) -> usize {
        let before = self.deadlines.len();
        self.deadlines.retain(|_, deadline| *deadline > now);
        before - self.deadlines.len()
    }

    pub fn count(&self) -> usize {
        self.deadlines.len()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}
