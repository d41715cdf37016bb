//! Request orchestrator: quota gate → prompt assembly → completion call →
//! exchange persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{
    context::ContextWindow,
    domain::{ChatMessage, ContentPart, PaymentRow, Role, Tier, UserId},
    policy,
    ports::CompletionClient,
    profiles::ProfileService,
    quota::QuotaTracker,
    Error, Result,
};

/// How an incoming request should be routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AskMode {
    /// The user's chosen model, no augmentation.
    Ask,
    /// The dedicated search model with the web plugin. Plus tier only.
    Search,
}

pub struct ChatService {
    profiles: Arc<ProfileService>,
    quota: Arc<QuotaTracker>,
    context: Arc<ContextWindow>,
    completion: Arc<dyn CompletionClient>,
}

impl ChatService {
    pub fn new(
        profiles: Arc<ProfileService>,
        quota: Arc<QuotaTracker>,
        context: Arc<ContextWindow>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            profiles,
            quota,
            context,
            completion,
        }
    }

    pub fn profiles(&self) -> &Arc<ProfileService> {
        &self.profiles
    }

    /// Quota pre-check for handlers that want to refuse before doing heavy
    /// work (file downloads). `handle_request` enforces it again.
    pub async fn can_send(&self, user_id: UserId) -> Result<bool> {
        self.quota.can_send(user_id).await
    }

    /// Run one user turn end to end and return the assistant's text.
    pub async fn handle_request(
        &self,
        user_id: UserId,
        content: Vec<ContentPart>,
        mode: AskMode,
    ) -> Result<String> {
        if !self.quota.can_send(user_id).await? {
            return Err(Error::QuotaExceeded);
        }

        let row = self.profiles.get_or_create(user_id).await?;
        if mode == AskMode::Search && row.tier != Tier::Plus {
            return Err(Error::ModelNotAllowed);
        }

        let mut messages = Vec::new();
        if let Some(prompt) = &row.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend(self.context.get(user_id).await?);
        messages.push(ChatMessage::parts(Role::User, content.clone()));

        let reply = match mode {
            AskMode::Ask => {
                self.completion
                    .complete(&row.current_model, &messages, None)
                    .await?
            }
            AskMode::Search => {
                let plugins = [policy::web_search_plugin()];
                self.completion
                    .complete(policy::SEARCH_MODEL, &messages, Some(&plugins))
                    .await?
            }
        };

        self.record_exchange(user_id, content, &reply).await?;
        Ok(reply)
    }

    /// Persist one completed exchange: the user message, then the reply.
    /// Each stored role consumes one quota unit, so a full exchange costs
    /// two. Kept in this single operation so a future change to the counting
    /// rule touches one place.
    async fn record_exchange(
        &self,
        user_id: UserId,
        user_content: Vec<ContentPart>,
        reply: &str,
    ) -> Result<()> {
        self.quota.increment(user_id).await?;
        self.context.append(user_id, Role::User, user_content).await?;

        self.quota.increment(user_id).await?;
        self.context
            .append(user_id, Role::Assistant, vec![ContentPart::text(reply)])
            .await?;
        Ok(())
    }

    /// Switch the stored model; a successful switch clears the context
    /// window.
    pub async fn set_model(&self, user_id: UserId, model: &str) -> Result<bool> {
        if !self.profiles.set_model(user_id, model).await? {
            return Ok(false);
        }
        self.context.reset(user_id).await?;
        Ok(true)
    }

    pub async fn reset_context(&self, user_id: UserId) -> Result<()> {
        self.context.reset(user_id).await
    }

    /// Settle a confirmed payment: upgrade the tier, then record the charge.
    /// Recording is best-effort relative to the upgrade — a failed insert is
    /// logged but does not roll the tier back.
    pub async fn confirm_payment(
        &self,
        user_id: UserId,
        charge_id: &str,
        amount: i64,
        currency: &str,
        end_date: DateTime<Utc>,
    ) -> Result<()> {
        self.profiles.upgrade(user_id, end_date).await?;

        let row = PaymentRow {
            user_id: user_id.0,
            telegram_payment_charge_id: charge_id.to_string(),
            amount,
            currency: currency.to_string(),
            status: "completed".to_string(),
        };
        if let Err(e) = self.profiles.record_payment(&row).await {
            warn!(user_id = user_id.0, error = %e, "payment recorded upgrade but not the charge row");
        }
        Ok(())
    }
}
