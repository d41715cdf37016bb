use async_trait::async_trait;

use crate::{
    domain::{ChatMessage, ContentPart, ContextEntry, PaymentRow, Role, SearchPlugin, UserId,
             UserPatch, UserRow},
    Result,
};

/// Hexagonal port for the remote profile store (Supabase in production,
/// an in-memory double in tests).
///
/// Every call re-reads/re-writes the remote store. There is deliberately no
/// caching layer: concurrent updates from other processes must stay visible.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    // `users` table
    async fn fetch_user(&self, user_id: UserId) -> Result<Option<UserRow>>;
    async fn insert_user(&self, row: &UserRow) -> Result<UserRow>;
    async fn update_user(&self, user_id: UserId, patch: &UserPatch) -> Result<()>;

    // `user_context` table
    /// The `limit` newest entries, newest first.
    async fn recent_context(&self, user_id: UserId, limit: usize) -> Result<Vec<ContextEntry>>;
    /// All entry ids for the user, newest first (used for trimming).
    async fn context_ids_newest_first(&self, user_id: UserId) -> Result<Vec<i64>>;
    async fn insert_context(
        &self,
        user_id: UserId,
        role: Role,
        content: Vec<ContentPart>,
    ) -> Result<()>;
    async fn delete_context_by_ids(&self, ids: &[i64]) -> Result<()>;
    async fn delete_context(&self, user_id: UserId) -> Result<()>;

    // `payments` table
    async fn insert_payment(&self, row: &PaymentRow) -> Result<()>;
}

/// Hexagonal port for the chat-completion API (OpenRouter in production).
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run the assembled message list against `model` and return the
    /// assistant's text.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        plugins: Option<&[SearchPlugin]>,
    ) -> Result<String>;
}
