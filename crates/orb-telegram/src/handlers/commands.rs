use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, LabeledPrice, ParseMode},
};

use orb_core::{
    chat::AskMode,
    domain::{ContentPart, UserId},
    formatting::{self, escape_html},
};

use crate::router::AppState;

use super::ask::{run_ask, AskContext};

pub const MODEL_CALLBACK_PREFIX: &str = "model_";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Invoice amounts are `i32` on the wire; a misconfigured price saturates
/// instead of wrapping.
fn stars_amount(price: u32) -> i32 {
    i32::try_from(price).unwrap_or(i32::MAX)
}

/// One button per model, current model marked.
pub fn model_keyboard(models: &[&'static str], current: &str) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = models
        .iter()
        .map(|&m| {
            let label = if m == current {
                format!("✅ {m}")
            } else {
                m.to_string()
            };
            vec![InlineKeyboardButton::callback(
                label,
                format!("{MODEL_CALLBACK_PREFIX}{m}"),
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user_id = UserId(user.id.0 as i64);
    let chat_id = msg.chat.id;

    let (cmd, arg) = parse_command(text);

    match cmd.as_str() {
        "start" | "help" => {
            bot.send_message(chat_id, formatting::welcome())
                .parse_mode(ParseMode::Html)
                .await?;
        }

        "profile" => match state.chat.profiles().profile(user_id).await {
            Ok(p) => {
                bot.send_message(chat_id, formatting::profile_text(&p))
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            Err(err) => {
                bot.send_message(chat_id, formatting::user_message(&err))
                    .await?;
            }
        },

        "model" => match state.chat.profiles().get_or_create(user_id).await {
            Ok(row) => {
                let models = orb_core::policy::available_models(row.tier);
                bot.send_message(chat_id, "Choose a model:")
                    .reply_markup(model_keyboard(models, &row.current_model))
                    .await?;
            }
            Err(err) => {
                bot.send_message(chat_id, formatting::user_message(&err))
                    .await?;
            }
        },

        "setprompt" => {
            if arg.is_empty() {
                bot.send_message(chat_id, "Usage: /setprompt <text>").await?;
                return Ok(());
            }
            match state.chat.profiles().set_system_prompt(user_id, &arg).await {
                Ok(()) => {
                    bot.send_message(chat_id, "✅ System prompt saved.").await?;
                }
                Err(err) => {
                    bot.send_message(chat_id, formatting::user_message(&err))
                        .await?;
                }
            }
        }

        "getprompt" => match state.chat.profiles().system_prompt(user_id).await {
            Ok(Some(prompt)) => {
                bot.send_message(
                    chat_id,
                    format!("Current system prompt:\n<code>{}</code>", escape_html(&prompt)),
                )
                .parse_mode(ParseMode::Html)
                .await?;
            }
            Ok(None) => {
                bot.send_message(chat_id, "No system prompt set.").await?;
            }
            Err(err) => {
                bot.send_message(chat_id, formatting::user_message(&err))
                    .await?;
            }
        },

        "resetprompt" => match state.chat.profiles().reset_system_prompt(user_id).await {
            Ok(()) => {
                bot.send_message(chat_id, "✅ System prompt cleared.").await?;
            }
            Err(err) => {
                bot.send_message(chat_id, formatting::user_message(&err))
                    .await?;
            }
        },

        "resetcontext" => match state.chat.reset_context(user_id).await {
            Ok(()) => {
                bot.send_message(chat_id, "🧹 Context cleared. Starting fresh.")
                    .await?;
            }
            Err(err) => {
                bot.send_message(chat_id, formatting::user_message(&err))
                    .await?;
            }
        },

        "upgrade" => {
            match state.chat.profiles().get_or_create(user_id).await {
                Ok(row) if row.tier == orb_core::domain::Tier::Plus => {
                    bot.send_message(chat_id, "You're already on the plus plan. See /profile.")
                        .await?;
                    return Ok(());
                }
                Ok(_) => {}
                Err(err) => {
                    bot.send_message(chat_id, formatting::user_message(&err))
                        .await?;
                    return Ok(());
                }
            }

            let price = state.cfg.subscription_price_stars;
            let days = state.cfg.subscription_days;
            // Telegram Stars: empty provider token, XTR currency.
            bot.send_invoice(
                chat_id,
                "Plus subscription".to_string(),
                format!(
                    "{days} days of the plus plan: higher limits and premium models."
                ),
                "plus-subscription".to_string(),
                String::new(),
                super::payment::STARS_CURRENCY.to_string(),
                vec![LabeledPrice {
                    label: "Plus subscription".to_string(),
                    amount: stars_amount(price),
                }],
            )
            .await?;
        }

        "ask" | "search" => {
            if arg.is_empty() {
                bot.send_message(chat_id, format!("Usage: /{cmd} <your question>"))
                    .await?;
                return Ok(());
            }
            let mode = if cmd == "search" {
                AskMode::Search
            } else {
                AskMode::Ask
            };
            let ctx = AskContext {
                bot,
                state,
                chat_id,
                user_id,
            };
            return run_ask(ctx, vec![ContentPart::text(arg)], mode).await;
        }

        _ => {
            bot.send_message(chat_id, "Unknown command. See /help.").await?;
        }
    }

    Ok(())
}
