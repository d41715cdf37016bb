//! Bounded rolling conversation history.
//!
//! The store keeps at most `window` entries per user, oldest evicted first.
//! The window is cleared on explicit `/resetcontext` and on every successful
//! model switch (different models do not share comparable context).

use std::sync::Arc;

use crate::{
    domain::{ChatMessage, ContentPart, Role, UserId},
    ports::ProfileStore,
    Result,
};

pub struct ContextWindow {
    store: Arc<dyn ProfileStore>,
    window: usize,
}

impl ContextWindow {
    pub fn new(store: Arc<dyn ProfileStore>, window: usize) -> Self {
        Self { store, window }
    }

    /// Insert a new entry, then trim so exactly the `window` most recent
    /// entries remain.
    pub async fn append(&self, user_id: UserId, role: Role, content: Vec<ContentPart>) -> Result<()> {
        self.store.insert_context(user_id, role, content).await?;

        let ids = self.store.context_ids_newest_first(user_id).await?;
        if ids.len() > self.window {
            self.store.delete_context_by_ids(&ids[self.window..]).await?;
        }
        Ok(())
    }

    /// The `window` most recent entries in chronological (oldest-first)
    /// order, shaped for a completion request.
    pub async fn get(&self, user_id: UserId) -> Result<Vec<ChatMessage>> {
        let mut entries = self.store.recent_context(user_id, self.window).await?;
        entries.reverse();
        Ok(entries
            .into_iter()
            .map(|e| ChatMessage::parts(e.role, e.content))
            .collect())
    }

    pub async fn reset(&self, user_id: UserId) -> Result<()> {
        self.store.delete_context(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageContent;
    use crate::testing::MemoryStore;

    fn text(parts: &str) -> Vec<ContentPart> {
        vec![ContentPart::text(parts)]
    }

    #[tokio::test]
    async fn appends_stay_within_the_window() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ContextWindow::new(store.clone(), 3);
        let user = UserId(1);

        for i in 0..5 {
            ctx.append(user, Role::User, text(&format!("m{i}"))).await.unwrap();
        }

        let got = ctx.get(user).await.unwrap();
        assert_eq!(got.len(), 3);
        // The three most recent, oldest first; m0/m1 were evicted.
        let texts: Vec<_> = got
            .iter()
            .map(|m| match &m.content {
                MessageContent::Parts(p) => match &p[0] {
                    ContentPart::Text { text } => text.clone(),
                    other => panic!("unexpected part: {other:?}"),
                },
                other => panic!("unexpected content: {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn overflow_evicts_exactly_the_oldest_entry() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ContextWindow::new(store.clone(), 2);
        let user = UserId(1);

        ctx.append(user, Role::User, text("first")).await.unwrap();
        ctx.append(user, Role::Assistant, text("second")).await.unwrap();
        ctx.append(user, Role::User, text("third")).await.unwrap();

        let ids = store.context_ids_newest_first(user).await.unwrap();
        assert_eq!(ids.len(), 2);

        let got = ctx.get(user).await.unwrap();
        assert_eq!(got[0].role, Role::Assistant);
        assert_eq!(got[1].role, Role::User);
    }

    #[tokio::test]
    async fn reset_clears_everything_for_the_user_only() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ContextWindow::new(store.clone(), 10);

        ctx.append(UserId(1), Role::User, text("a")).await.unwrap();
        ctx.append(UserId(2), Role::User, text("b")).await.unwrap();

        ctx.reset(UserId(1)).await.unwrap();
        assert!(ctx.get(UserId(1)).await.unwrap().is_empty());
        assert_eq!(ctx.get(UserId(2)).await.unwrap().len(), 1);
    }
}
