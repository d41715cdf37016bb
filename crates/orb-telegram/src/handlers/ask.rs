use std::sync::Arc;

use teloxide::{prelude::*, types::ChatAction};
use tracing::warn;

use orb_core::{
    chat::AskMode,
    domain::{ContentPart, UserId},
    formatting,
};

use crate::router::AppState;

// Telegram caps messages at 4096 chars; stay under it with headroom.
const CHUNK_LEN: usize = 4000;

#[derive(Clone)]
pub struct AskContext {
    pub bot: Bot,
    pub state: Arc<AppState>,
    pub chat_id: teloxide::types::ChatId,
    pub user_id: UserId,
}

/// Run one request through the chat service, keeping a typing indicator
/// alive while the completion is in flight, and send the reply (or a
/// user-readable error) back to the chat.
pub async fn run_ask(ctx: AskContext, content: Vec<ContentPart>, mode: AskMode) -> ResponseResult<()> {
    // Typing loop (best-effort).
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();
    let bot_for_typing = ctx.bot.clone();
    let chat_for_typing = ctx.chat_id;
    let typing_task = tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(3));
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let _ = bot_for_typing.send_chat_action(chat_for_typing, ChatAction::Typing).await;
                }
                _ = &mut stop_rx => break,
            }
        }
    });

    let result = ctx
        .state
        .chat
        .handle_request(ctx.user_id, content, mode)
        .await;

    let _ = stop_tx.send(());
    let _ = typing_task.await;

    match result {
        Ok(reply) => {
            let prefix = match mode {
                AskMode::Ask => "🤖",
                AskMode::Search => "🔍",
            };
            for chunk in split_message(&format!("{prefix} {reply}"), CHUNK_LEN) {
                let _ = ctx.bot.send_message(ctx.chat_id, chunk).await;
            }
        }
        Err(err) => {
            warn!(user_id = ctx.user_id.0, error = %err, "request failed");
            let _ = ctx
                .bot
                .send_message(ctx.chat_id, formatting::user_message(&err))
                .await;
        }
    }

    Ok(())
}

/// Split on char boundaries, preferring the last newline inside each chunk.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let end = (i + max_chars).min(chars.len());
        let mut cut = end;
        if end < chars.len() {
            if let Some(pos) = chars[i..end].iter().rposition(|&c| c == '\n') {
                if pos > 0 {
                    cut = i + pos;
                }
            }
        }
        out.push(chars[i..cut].iter().collect());
        i = cut;
        // Skip the newline we cut on.
        if i < chars.len() && chars[i] == '\n' {
            i += 1;
        }
    }

    if out.is_empty() {
        out.push(String::new());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_is_a_single_chunk() {
        assert_eq!(split_message("hello", 4000), vec!["hello".to_string()]);
    }

    #[test]
    fn long_message_splits_on_a_newline() {
        let text = format!("{}\n{}", "a".repeat(30), "b".repeat(30));
        let chunks = split_message(&text, 40);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(30));
        assert_eq!(chunks[1], "b".repeat(30));
    }

    #[test]
    fn unbroken_text_splits_at_the_limit() {
        let text = "x".repeat(90);
        let chunks = split_message(&text, 40);
        assert_eq!(
            chunks.iter().map(String::len).collect::<Vec<_>>(),
            vec![40, 40, 10]
        );
    }
}
