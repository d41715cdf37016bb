//! Daily/monthly message quota enforcement.
//!
//! The check happens before counters move: a message is accepted only while
//! both counters are strictly below the tier limits. Two concurrent requests
//! can both pass the check before either increments — an accepted weak
//! consistency trade-off, not something a distributed lock guards against.

use std::sync::Arc;

use crate::{
    domain::{UserId, UserPatch},
    policy,
    ports::ProfileStore,
    profiles::ProfileService,
    Result,
};

pub struct QuotaTracker {
    profiles: Arc<ProfileService>,
    store: Arc<dyn ProfileStore>,
}

impl QuotaTracker {
    pub fn new(profiles: Arc<ProfileService>, store: Arc<dyn ProfileStore>) -> Self {
        Self { profiles, store }
    }

    /// True iff the user may send another message right now. A store failure
    /// propagates as an error; callers must treat that as "not allowed".
    pub async fn can_send(&self, user_id: UserId) -> Result<bool> {
        let row = self.profiles.get_or_create(user_id).await?;
        let limits = policy::limits(row.tier);
        Ok(row.daily_count < limits.daily && row.monthly_count < limits.monthly)
    }

    /// Add one to both counters. Called once per stored context entry, not
    /// per attempt.
    pub async fn increment(&self, user_id: UserId) -> Result<()> {
        let row = self.profiles.get_or_create(user_id).await?;
        let patch = UserPatch {
            daily_count: Some(row.daily_count + 1),
            monthly_count: Some(row.monthly_count + 1),
            ..Default::default()
        };
        self.store.update_user(user_id, &patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn tracker(store: Arc<MemoryStore>) -> QuotaTracker {
        let profiles = Arc::new(ProfileService::new(store.clone()));
        QuotaTracker::new(profiles, store)
    }

    #[tokio::test]
    async fn fresh_user_can_send() {
        let store = Arc::new(MemoryStore::new());
        let quota = tracker(store);
        assert!(quota.can_send(UserId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn daily_limit_blocks_until_reset() {
        let store = Arc::new(MemoryStore::new());
        let quota = tracker(store.clone());
        let user = UserId(1);

        let daily = policy::limits(crate::domain::Tier::Lite).daily;
        for _ in 0..daily {
            assert!(quota.can_send(user).await.unwrap());
            quota.increment(user).await.unwrap();
        }
        assert!(!quota.can_send(user).await.unwrap());

        // A date rollover (lazy reset on the next read) reopens the gate.
        store.backdate_daily_anchor(user, chrono::Duration::days(1));
        assert!(quota.can_send(user).await.unwrap());
    }

    #[tokio::test]
    async fn monthly_limit_blocks_independently_of_daily() {
        let store = Arc::new(MemoryStore::new());
        let quota = tracker(store.clone());
        let user = UserId(1);

        quota.can_send(user).await.unwrap(); // create the row
        let limits = policy::limits(crate::domain::Tier::Lite);
        store.bump_counters(user, 0, limits.monthly);
        assert!(!quota.can_send(user).await.unwrap());
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let store = Arc::new(MemoryStore::new());
        let quota = tracker(store.clone());

        store.fail_next_ops(true);
        assert!(quota.can_send(UserId(1)).await.is_err());
    }
}
