//! User profile access on top of the remote store.
//!
//! Profiles are created lazily on first read and counter resets are applied
//! on every read (no background timer — quota is only consulted at message
//! time, so access-triggered resets are sufficient).

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    domain::{Tier, UserId, UserPatch, UserRow},
    policy,
    ports::ProfileStore,
    Result,
};

/// Read-model for `/profile`.
#[derive(Clone, Debug)]
pub struct ProfileSummary {
    pub user_id: i64,
    pub tier: Tier,
    pub current_model: String,
    pub daily_remaining: i64,
    pub monthly_remaining: i64,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Load the user's row, creating the default `lite` row on first contact
    /// and applying the lazy daily/monthly reset rule.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<UserRow> {
        let today = Utc::now().date_naive();

        match self.store.fetch_user(user_id).await? {
            Some(mut row) => {
                if let Some(patch) = reset_patch(&row, today) {
                    self.store.update_user(user_id, &patch).await?;
                    apply_patch_counters(&mut row, &patch);
                }
                Ok(row)
            }
            None => {
                let row = UserRow::new_default(user_id, policy::DEFAULT_MODEL, today);
                self.store.insert_user(&row).await
            }
        }
    }

    pub async fn system_prompt(&self, user_id: UserId) -> Result<Option<String>> {
        Ok(self.get_or_create(user_id).await?.system_prompt)
    }

    pub async fn set_system_prompt(&self, user_id: UserId, prompt: &str) -> Result<()> {
        self.get_or_create(user_id).await?;
        let patch = UserPatch {
            system_prompt: Some(Some(prompt.to_string())),
            ..Default::default()
        };
        self.store.update_user(user_id, &patch).await
    }

    pub async fn reset_system_prompt(&self, user_id: UserId) -> Result<()> {
        self.get_or_create(user_id).await?;
        let patch = UserPatch {
            system_prompt: Some(None),
            ..Default::default()
        };
        self.store.update_user(user_id, &patch).await
    }

    /// Persist a model choice. Returns `false` (leaving state untouched) when
    /// the model is not in the caller's tier list.
    pub async fn set_model(&self, user_id: UserId, model: &str) -> Result<bool> {
        let row = self.get_or_create(user_id).await?;
        if !policy::is_model_allowed(row.tier, model) {
            return Ok(false);
        }

        let patch = UserPatch {
            current_model: Some(model.to_string()),
            ..Default::default()
        };
        self.store.update_user(user_id, &patch).await?;
        Ok(true)
    }

    /// Upgrade to `plus`: counters and their reset anchors start over and the
    /// subscription expiry is recorded. There is no downgrade path.
    pub async fn upgrade(&self, user_id: UserId, end_date: DateTime<Utc>) -> Result<()> {
        self.get_or_create(user_id).await?;
        let today = Utc::now().date_naive();
        let patch = UserPatch {
            tier: Some(Tier::Plus),
            daily_count: Some(0),
            monthly_count: Some(0),
            last_daily_reset: Some(today),
            last_monthly_reset: Some(today),
            subscription_end_date: Some(Some(end_date)),
            ..Default::default()
        };
        self.store.update_user(user_id, &patch).await
    }

    pub async fn record_payment(&self, row: &crate::domain::PaymentRow) -> Result<()> {
        self.store.insert_payment(row).await
    }

    pub async fn profile(&self, user_id: UserId) -> Result<ProfileSummary> {
        let row = self.get_or_create(user_id).await?;
        let limits = policy::limits(row.tier);
        Ok(ProfileSummary {
            user_id: row.user_id,
            tier: row.tier,
            current_model: row.current_model,
            daily_remaining: (limits.daily - row.daily_count).max(0),
            monthly_remaining: (limits.monthly - row.monthly_count).max(0),
            subscription_end_date: row.subscription_end_date,
        })
    }
}

/// Lazy reset rule: the daily counter resets when the stored date differs
/// from today; the monthly counter resets when the stored calendar month
/// (year + month) differs from the current one. All dates are UTC.
fn reset_patch(row: &UserRow, today: NaiveDate) -> Option<UserPatch> {
    let mut patch = UserPatch::default();

    if row.last_daily_reset != today {
        patch.daily_count = Some(0);
        patch.last_daily_reset = Some(today);
    }

    if (row.last_monthly_reset.year(), row.last_monthly_reset.month())
        != (today.year(), today.month())
    {
        patch.monthly_count = Some(0);
        patch.last_monthly_reset = Some(today);
    }

    if patch.is_empty() {
        None
    } else {
        Some(patch)
    }
}

fn apply_patch_counters(row: &mut UserRow, patch: &UserPatch) {
    if let Some(n) = patch.daily_count {
        row.daily_count = n;
    }
    if let Some(n) = patch.monthly_count {
        row.monthly_count = n;
    }
    if let Some(d) = patch.last_daily_reset {
        row.last_daily_reset = d;
    }
    if let Some(d) = patch.last_monthly_reset {
        row.last_monthly_reset = d;
    }
}
