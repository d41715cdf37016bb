//! Telegram update handlers.
//!
//! Each handler validates the update shape, maps it onto one `ChatService`
//! operation and formats the outcome for the chat.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, PreCheckoutQuery},
};

use crate::router::AppState;

mod ask;
mod callback;
mod commands;
mod media;
mod payment;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_pre_checkout(
    bot: Bot,
    q: PreCheckoutQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    payment::handle_pre_checkout(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.successful_payment().is_some() {
        return payment::handle_successful_payment(bot, msg, state).await;
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
        return text::handle_text(bot, msg, state).await;
    }

    if msg.photo().is_some() || msg.document().is_some() {
        return media::handle_media(bot, msg, state).await;
    }

    Ok(())
}
