use std::sync::Arc;

use teloxide::prelude::*;

use orb_core::{
    domain::{Tier, UserId},
    formatting, policy,
};

use crate::router::AppState;

/// Plain text. A message that is exactly a model id available on the user's
/// tier switches the model; any other text is ignored — questions go
/// through /ask.
pub async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let trimmed = text.trim();
    if !is_model_candidate(trimmed) {
        return Ok(());
    }

    let user_id = UserId(user.id.0 as i64);
    match state.chat.set_model(user_id, trimmed).await {
        Ok(true) => {
            bot.send_message(
                msg.chat.id,
                format!("✅ Model set to {trimmed}. Context cleared."),
            )
            .await?;
        }
        // A model outside the user's tier is treated like any other text.
        Ok(false) => {}
        Err(err) => {
            bot.send_message(msg.chat.id, formatting::user_message(&err))
                .await?;
        }
    }

    Ok(())
}

/// True when the text names any known model id. The tier check happens in
/// `set_model`, which leaves state untouched on refusal.
fn is_model_candidate(text: &str) -> bool {
    policy::is_model_allowed(Tier::Plus, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_are_recognized() {
        assert!(is_model_candidate("openai/gpt-4.1"));
        assert!(is_model_candidate("anthropic/claude-sonnet-4"));
    }

    #[test]
    fn ordinary_text_is_not_a_model_switch() {
        assert!(!is_model_candidate("what is rust?"));
        assert!(!is_model_candidate("2+2?"));
        assert!(!is_model_candidate(""));
    }
}
