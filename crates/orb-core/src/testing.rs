//! In-memory doubles for the store and completion ports.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    domain::{ChatMessage, ContentPart, ContextEntry, PaymentRow, Role, SearchPlugin, UserId,
             UserPatch, UserRow},
    ports::{CompletionClient, ProfileStore},
    Error, Result,
};

#[derive(Default)]
struct MemoryInner {
    users: Vec<UserRow>,
    context: Vec<ContextEntry>,
    payments: Vec<PaymentRow>,
    next_id: i64,
}

/// `ProfileStore` double backed by plain vectors. `fail_next_ops` makes
/// every operation return `Error::Store`, for fail-closed tests.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_next_ops(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn context_len(&self, user_id: UserId) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.context.iter().filter(|e| e.user_id == user_id.0).count()
    }

    pub fn payments(&self) -> Vec<PaymentRow> {
        self.inner.lock().unwrap().payments.clone()
    }

    /// Directly add to a user's counters, bypassing the tracker.
    pub fn bump_counters(&self, user_id: UserId, daily: i64, monthly: i64) {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .users
            .iter_mut()
            .find(|r| r.user_id == user_id.0)
            .expect("user row exists");
        row.daily_count += daily;
        row.monthly_count += monthly;
    }

    /// Move the stored daily reset anchor into the past to simulate a date
    /// rollover.
    pub fn backdate_daily_anchor(&self, user_id: UserId, by: Duration) {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .users
            .iter_mut()
            .find(|r| r.user_id == user_id.0)
            .expect("user row exists");
        row.last_daily_reset = row.last_daily_reset - by;
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Store("store unavailable".to_string()));
        }
        Ok(())
    }

    fn synthetic_created_at(id: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn fetch_user(&self, user_id: UserId) -> Result<Option<UserRow>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|r| r.user_id == user_id.0).cloned())
    }

    async fn insert_user(&self, row: &UserRow) -> Result<UserRow> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.users.push(row.clone());
        Ok(row.clone())
    }

    async fn update_user(&self, user_id: UserId, patch: &UserPatch) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.users.iter_mut().find(|r| r.user_id == user_id.0) else {
            return Err(Error::Store(format!("no user row for {}", user_id.0)));
        };

        if let Some(tier) = patch.tier {
            row.tier = tier;
        }
        if let Some(prompt) = &patch.system_prompt {
            row.system_prompt = prompt.clone();
        }
        if let Some(model) = &patch.current_model {
            row.current_model = model.clone();
        }
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
        if let Some(end) = &patch.subscription_end_date {
            row.subscription_end_date = *end;
        }
        Ok(())
    }

    async fn recent_context(&self, user_id: UserId, limit: usize) -> Result<Vec<ContextEntry>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .context
            .iter()
            .filter(|e| e.user_id == user_id.0)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn context_ids_newest_first(&self, user_id: UserId) -> Result<Vec<i64>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .context
            .iter()
            .filter(|e| e.user_id == user_id.0)
            .map(|e| (e.created_at, e.id))
            .collect();
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }

    async fn insert_context(
        &self,
        user_id: UserId,
        role: Role,
        content: Vec<ContentPart>,
    ) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.context.push(ContextEntry {
            id,
            user_id: user_id.0,
            role,
            content,
            created_at: Self::synthetic_created_at(id),
        });
        Ok(())
    }

    async fn delete_context_by_ids(&self, ids: &[i64]) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.context.retain(|e| !ids.contains(&e.id));
        Ok(())
    }

    async fn delete_context(&self, user_id: UserId) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.context.retain(|e| e.user_id != user_id.0);
        Ok(())
    }

    async fn insert_payment(&self, row: &PaymentRow) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.payments.push(row.clone());
        Ok(())
    }
}

/// One recorded `complete` call.
#[derive(Clone, Debug)]
pub struct CompletionCall {
    pub model: String,
    pub message_count: usize,
    pub first_role: Option<Role>,
    pub with_plugins: bool,
}

/// `CompletionClient` double with a canned reply (or canned failure).
pub struct FakeCompletion {
    reply: Option<String>,
    calls: Mutex<Vec<CompletionCall>>,
}

impl FakeCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        plugins: Option<&[SearchPlugin]>,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(CompletionCall {
            model: model.to_string(),
            message_count: messages.len(),
            first_role: messages.first().map(|m| m.role),
            with_plugins: plugins.is_some(),
        });

        match &self.reply {
            Some(r) => Ok(r.clone()),
            None => Err(Error::Completion("canned failure".to_string())),
        }
    }
}
