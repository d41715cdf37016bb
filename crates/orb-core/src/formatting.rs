//! User-facing message formatting (Telegram HTML parse mode).

use crate::{profiles::ProfileSummary, Error};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Map an internal error to the single line shown to the user. Internal
/// detail stays in the logs.
pub fn user_message(err: &Error) -> String {
    match err {
        Error::QuotaExceeded => {
            "⛔ You've reached your message limit. Limits reset daily and monthly; \
             /upgrade raises them."
                .to_string()
        }
        Error::ModelNotAllowed => {
            "⛔ That model is not available on your plan. Use /upgrade to unlock it."
                .to_string()
        }
        Error::FileProcessing(_) => {
            "⚠️ I couldn't process that file. Please send a valid image or PDF.".to_string()
        }
        Error::Download(_) => {
            "⚠️ I couldn't download that file from Telegram. Please try again.".to_string()
        }
        Error::Completion(_) => {
            "⚠️ The model did not answer. Please try again in a moment.".to_string()
        }
        _ => "⚠️ Something went wrong. Please try again later.".to_string(),
    }
}

pub fn welcome() -> String {
    "👋 Hi! I'm a chat assistant.\n\n\
     Ask me anything with /ask &lt;question&gt;, or /search &lt;question&gt; \
     for web-backed answers on the plus plan.\n\n\
     You can also attach images and PDF documents — caption them with /ask.\n\n\
     Commands:\n\
     /profile — your plan, model and remaining messages\n\
     /model — choose a model\n\
     /setprompt &lt;text&gt; — set a system prompt\n\
     /getprompt — show the system prompt\n\
     /resetprompt — clear the system prompt\n\
     /resetcontext — forget the conversation so far\n\
     /upgrade — subscribe to the plus plan"
        .to_string()
}

pub fn profile_text(p: &ProfileSummary) -> String {
    let mut out = format!(
        "<b>Your profile</b>\n\n\
         Plan: <b>{}</b>\n\
         Model: <code>{}</code>\n\
         Messages left today: <b>{}</b>\n\
         Messages left this month: <b>{}</b>",
        p.tier.as_str(),
        escape_html(&p.current_model),
        p.daily_remaining,
        p.monthly_remaining,
    );
    if let Some(end) = p.subscription_end_date {
        out.push_str(&format!(
            "\nSubscription active until: <b>{}</b>",
            end.format("%Y-%m-%d")
        ));
    }
    out
}

pub fn upgrade_thanks() -> String {
    "🎉 Thank you! Your plus subscription is active: higher limits and \
     premium models are unlocked."
        .to_string()
}

pub fn media_usage_hint() -> String {
    "Add a caption starting with /ask (or /search) so I know what to do with this file."
        .to_string()
}
