use super::{AuthToken, ExpiringSet, Identifier, LeakyBucket, UserSet};
use crate::error::DirectoryError;
use parking_lot::Mutex;

struct Inner {
    s1: UserSet,
    s2_added: ExpiringSet,
    s2_removed: ExpiringSet,
    b_full: LeakyBucket,
    b_inc: LeakyBucket,
}

/// Composes `UserSet` + two `ExpiringSet`s + two `LeakyBucket`s and owns the
/// register/unregister/discovery operations and their invariants.
///
/// All five containers live behind a single `parking_lot::Mutex`: every
/// externally observable operation is a critical section, from the initial
/// authentication read through any write, per `spec.md` §5. Because nothing
/// in these operations ever awaits (they are O(|contacts|) memory-bound
/// work), a plain sync mutex is the correct tool — it is never held across
/// a suspension point.
pub struct Directory {
    inner: Mutex<Inner>,
    max_contacts: u32,
}

/// Read-only snapshot of container sizes, for operability (not a protocol
/// feature — see the `/metrics` and operator-CLI `/stats` uses).
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySnapshot {
    pub registered_users: usize,
    pub pending_added: usize,
    pub pending_removed: usize,
    pub full_sync_buckets: usize,
    pub incremental_sync_buckets: usize,
}

impl Directory {
    /// `delta_secs` is Δ, shared by both delta sets and `B_full`'s drain
    /// period. `p_inc_secs` is `B_inc`'s drain period. `max_contacts` is C.
    pub fn new(delta_secs: u64, p_inc_secs: u64, max_contacts: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                s1: UserSet::new(),
                s2_added: ExpiringSet::new(delta_secs),
                s2_removed: ExpiringSet::new(delta_secs),
                b_full: LeakyBucket::new(max_contacts, delta_secs),
                b_inc: LeakyBucket::new(max_contacts, p_inc_secs),
            }),
            max_contacts,
        }
    }

    /// Removes expired entries from both delta sets. Handlers call this
    /// before every externally observable operation (see `spec.md` §4.4);
    /// `Directory` does not call it internally, per the Open Question this
    /// project resolves in `DESIGN.md`.
    pub fn sweep(&self, now: u64) {
        let mut inner = self.inner.lock();
        inner.s2_added.sweep(now);
        inner.s2_removed.sweep(now);
    }

    /// Registers a new user. A just-registered user cannot also be
    /// pending-removed, and announces itself to incremental-sync observers
    /// within Δ seconds.
    pub fn register(&self, user: Identifier, token: AuthToken, now: u64) {
        let mut inner = self.inner.lock();
        inner.s1.add(user.clone(), token);
        inner.s2_added.add(user.clone(), now);
        inner.s2_removed.remove(&user);
    }

    /// Unregisters a user. Requires a valid `(user, token)` pair.
    pub fn unregister(
        &self,
        user: &Identifier,
        token: &AuthToken,
        now: u64,
    ) -> Result<(), DirectoryError> {
        let mut inner = self.inner.lock();
        if !inner.s1.is_valid(user, token) {
            return Err(DirectoryError::AuthenticationInvalid);
        }
        inner.s1.remove(user);
        inner.s2_added.remove(user);
        inner.s2_removed.add(user.clone(), now);
        Ok(())
    }

    /// Intersects `contacts` against the full registered population.
    /// An empty contact list short-circuits without touching the bucket.
    pub fn full_sync(
        &self,
        user: &Identifier,
        token: &AuthToken,
        contacts: &[Identifier],
        now_secs: u64,
    ) -> Result<Vec<Identifier>, DirectoryError> {
        let mut inner = self.inner.lock();
        if !inner.s1.is_valid(user, token) {
            return Err(DirectoryError::AuthenticationInvalid);
        }
        if contacts.len() as u64 > u64::from(self.max_contacts) {
            return Err(DirectoryError::RateLimitExceeded);
        }
        if contacts.is_empty() {
            return Ok(Vec::new());
        }
        if !inner
            .b_full
            .admit(user, contacts.len() as u32, now_secs as f64)
        {
            return Err(DirectoryError::RateLimitExceeded);
        }
        Ok(inner.s1.intersect(contacts))
    }

    /// Intersects `contacts` against the registration/deregistration deltas
    /// of the last Δ seconds.
    pub fn incremental_sync(
        &self,
        user: &Identifier,
        token: &AuthToken,
        contacts: &[Identifier],
        now_secs: u64,
    ) -> Result<(Vec<Identifier>, Vec<Identifier>), DirectoryError> {
        let mut inner = self.inner.lock();
        if !inner.s1.is_valid(user, token) {
            return Err(DirectoryError::AuthenticationInvalid);
        }
        if contacts.len() as u64 > u64::from(self.max_contacts) {
            return Err(DirectoryError::RateLimitExceeded);
        }
        if contacts.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        if !inner
            .b_inc
            .admit(user, contacts.len() as u32, now_secs as f64)
        {
            return Err(DirectoryError::RateLimitExceeded);
        }
        let added = inner.s2_added.intersect(contacts);
        let removed = inner.s2_removed.intersect(contacts);
        Ok((added, removed))
    }

    /// Wholesale reset of all five containers (test/debug use only).
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.s1.clear();
        inner.s2_added.clear();
        inner.s2_removed.clear();
        inner.b_full.clear();
        inner.b_inc.clear();
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        let inner = self.inner.lock();
        DirectorySnapshot {
            registered_users: inner.s1.count(),
            pending_added: inner.s2_added.count(),
            pending_removed: inner.s2_removed.count(),
            full_sync_buckets: inner.b_full.count(),
            incremental_sync_buckets: inner.b_inc.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: u64 = 864_000;
    const P_INC: u64 = 86_400;
    const MAX_CONTACTS: u32 = 20_000;

    fn id(b: u8) -> Identifier {
        Identifier::from(vec![b; 16])
    }

    fn token(b: u8) -> AuthToken {
        AuthToken::from(vec![b; 16])
    }

    fn fresh() -> Directory {
        Directory::new(DELTA, P_INC, MAX_CONTACTS)
    }

    /// Invariant 7 — register/unregister round-trip.
    #[test]
    fn register_unregister_round_trip() {
        let dir = fresh();
        let (u, t) = (id(1), token(1));

        dir.register(u.clone(), t.clone(), 1000);
        assert_eq!(dir.snapshot().registered_users, 1);

        dir.unregister(&u, &t, 2000).unwrap();
        let snap = dir.snapshot();
        assert_eq!(snap.registered_users, 0);
        assert_eq!(snap.pending_removed, 1);
        assert_eq!(snap.pending_added, 0);
    }

    #[test]
    fn unregister_requires_valid_token() {
        let dir = fresh();
        let (u, t) = (id(1), token(1));
        dir.register(u.clone(), t, 1000);

        let err = dir.unregister(&u, &token(2), 1000).unwrap_err();
        assert_eq!(err, DirectoryError::AuthenticationInvalid);
        assert_eq!(dir.snapshot().registered_users, 1);
    }

    #[test]
    fn register_clears_pending_removal() {
        let dir = fresh();
        let (u, t) = (id(1), token(1));
        dir.register(u.clone(), t.clone(), 1000);
        dir.unregister(&u, &t, 2000).unwrap();
        assert_eq!(dir.snapshot().pending_removed, 1);

        dir.register(u, t, 3000);
        let snap = dir.snapshot();
        assert_eq!(snap.pending_removed, 0);
        assert_eq!(snap.pending_added, 1);
    }

    /// S3 — full sync correctness.
    #[test]
    fn full_sync_finds_exactly_the_known_present_set() {
        use std::collections::HashSet;

        let dir = fresh();
        let (client, client_token) = (id(0), token(0));
        dir.register(client.clone(), client_token.clone(), 0);

        let mut known: Vec<Identifier> = Vec::new();
        for i in 1u32..=1000 {
            let uid = Identifier::from(i.to_le_bytes().to_vec());
            dir.register(uid.clone(), AuthToken::from(i.to_le_bytes().to_vec()), 0);
            known.push(uid);
        }

        let absent: Vec<Identifier> = (2000u32..2900)
            .map(|i| Identifier::from(i.to_le_bytes().to_vec()))
            .collect();

        let mut query: Vec<Identifier> = known[..100].to_vec();
        query.extend(absent.into_iter());

        let found = dir
            .full_sync(&client, &client_token, &query, 100)
            .unwrap();
        let found_set: HashSet<_> = found.into_iter().collect();
        let expected: HashSet<_> = known[..100].iter().cloned().collect();
        assert_eq!(found_set, expected);
    }

    #[test]
    fn full_sync_empty_contacts_short_circuits_without_consuming_bucket() {
        let dir = fresh();
        let (u, t) = (id(1), token(1));
        dir.register(u.clone(), t.clone(), 0);

        assert_eq!(dir.full_sync(&u, &t, &[], 0).unwrap(), Vec::new());
        // Bucket untouched: a full-size sync still succeeds afterwards.
        let contacts: Vec<Identifier> = (0u32..MAX_CONTACTS)
            .map(|i| Identifier::from(i.to_le_bytes().to_vec()))
            .collect();
        assert!(dir.full_sync(&u, &t, &contacts, 0).is_ok());
    }

    #[test]
    fn full_sync_over_capacity_is_rate_limited() {
        let dir = fresh();
        let (u, t) = (id(1), token(1));
        dir.register(u.clone(), t.clone(), 0);

        let contacts: Vec<Identifier> = (0u32..=MAX_CONTACTS)
            .map(|i| Identifier::from(i.to_le_bytes().to_vec()))
            .collect();
        let err = dir.full_sync(&u, &t, &contacts, 0).unwrap_err();
        assert_eq!(err, DirectoryError::RateLimitExceeded);
    }

    /// S4 — incremental sync deltas.
    #[test]
    fn incremental_sync_reports_added_and_removed_deltas() {
        use std::collections::HashSet;

        let dir = fresh();
        let (client, client_token) = (id(0), token(0));
        dir.register(client.clone(), client_token.clone(), 0);

        for i in 1u32..=20_000 {
            let uid = Identifier::from(i.to_le_bytes().to_vec());
            dir.register(uid, AuthToken::from(i.to_le_bytes().to_vec()), 0);
        }

        let mut added_ids: Vec<Identifier> = Vec::new();
        for i in 0u32..100 {
            let uid = Identifier::from((100_000 + i).to_le_bytes().to_vec());
            dir.register(uid.clone(), AuthToken::from(vec![0u8; 16]), 10);
            added_ids.push(uid);
        }

        let mut removed_ids: Vec<Identifier> = Vec::new();
        for i in 0u32..200 {
            let uid = Identifier::from((200_000 + i).to_le_bytes().to_vec());
            let utoken = AuthToken::from(vec![1u8; 16]);
            dir.register(uid.clone(), utoken.clone(), 10);
            dir.unregister(&uid, &utoken, 20).unwrap();
            if i < 100 {
                removed_ids.push(uid);
            }
        }

        let unrelated: Vec<Identifier> = (300_000u32..300_800)
            .map(|i| Identifier::from(i.to_le_bytes().to_vec()))
            .collect();

        let mut query: Vec<Identifier> = added_ids.clone();
        query.extend(removed_ids.iter().cloned());
        query.extend(unrelated.into_iter());

        dir.sweep(30);
        let (added, removed) = dir
            .incremental_sync(&client, &client_token, &query, 30)
            .unwrap();

        let added_set: HashSet<_> = added.into_iter().collect();
        let expected_added: HashSet<_> = added_ids.into_iter().collect();
        assert_eq!(added_set, expected_added);

        let removed_set: HashSet<_> = removed.into_iter().collect();
        let expected_removed: HashSet<_> = removed_ids.into_iter().collect();
        assert_eq!(removed_set, expected_removed);
    }

    #[test]
    fn authentication_precedes_rate_limit_check() {
        let dir = fresh();
        let contacts: Vec<Identifier> = (0u32..=MAX_CONTACTS)
            .map(|i| Identifier::from(i.to_le_bytes().to_vec()))
            .collect();
        // Unregistered user, over-capacity contact list: auth fails first.
        let err = dir
            .full_sync(&id(99), &token(99), &contacts, 0)
            .unwrap_err();
        assert_eq!(err, DirectoryError::AuthenticationInvalid);
    }

    /// S5 — rate-limit recovery, using an explicit clock instead of a real
    /// sleep so the test is deterministic.
    #[test]
    fn rate_limit_recovers_after_drain_period() {
        let dir = Directory::new(DELTA, P_INC, MAX_CONTACTS);
        let (u, t) = (id(1), token(1));
        dir.register(u.clone(), t.clone(), 0);

        let contacts: Vec<Identifier> = (0u32..MAX_CONTACTS)
            .map(|i| Identifier::from(i.to_le_bytes().to_vec()))
            .collect();
        assert!(dir.incremental_sync(&u, &t, &contacts, 0).is_ok());

        let one = vec![id(200)];
        assert_eq!(
            dir.incremental_sync(&u, &t, &one, 0).unwrap_err(),
            DirectoryError::RateLimitExceeded
        );

        // After a full P_inc has elapsed, the bucket has fully drained.
        assert!(dir.incremental_sync(&u, &t, &one, P_INC).is_ok());
    }

    #[test]
    fn clear_resets_every_container() {
        let dir = fresh();
        let (u, t) = (id(1), token(1));
        dir.register(u.clone(), t.clone(), 0);
        dir.full_sync(&u, &t, &[id(2)], 0).unwrap();

        dir.clear();
        let snap = dir.snapshot();
        assert_eq!(snap.registered_users, 0);
        assert_eq!(snap.pending_added, 0);
        assert_eq!(snap.pending_removed, 0);
        assert_eq!(snap.full_sync_buckets, 0);
        assert_eq!(snap.incremental_sync_buckets, 0);
    }
}
