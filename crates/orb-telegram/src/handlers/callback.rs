use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use orb_core::{domain::UserId, policy};

use crate::router::AppState;

use super::commands::{model_keyboard, MODEL_CALLBACK_PREFIX};

/// Model-picker button presses (`model_{id}` callback data).
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let data = q.data.clone().unwrap_or_default();

    let Some(model) = data.strip_prefix(MODEL_CALLBACK_PREFIX) else {
        bot.answer_callback_query(cb_id).await?;
        return Ok(());
    };

    let user_id = UserId(q.from.id.0 as i64);

    match state.chat.set_model(user_id, model).await {
        Ok(true) => {
            bot.answer_callback_query(cb_id)
                .text(format!("Model set to {model}"))
                .await?;

            // Refresh the picker so the marker follows the selection.
            if let Some(message) = q.message {
                if let Ok(row) = state.chat.profiles().get_or_create(user_id).await {
                    let models = policy::available_models(row.tier);
                    let _ = bot
                        .edit_message_reply_markup(message.chat.id, message.id)
                        .reply_markup(model_keyboard(models, model))
                        .await;
                }
            }
        }
        Ok(false) => {
            bot.answer_callback_query(cb_id)
                .text("That model needs the plus plan. See /upgrade.")
                .show_alert(true)
                .await?;
        }
        Err(err) => {
            warn!(user_id = user_id.0, error = %err, "model switch failed");
            bot.answer_callback_query(cb_id)
                .text("Something went wrong, please try again.")
                .await?;
        }
    }

    Ok(())
}
