use std::sync::Arc;

use teloxide::{net::Download, prelude::*};
use tracing::warn;

use orb_core::{
    chat::AskMode,
    domain::{ContentPart, UserId},
    files, formatting, Error,
};

use crate::router::AppState;

use super::ask::{run_ask, AskContext};

const DEFAULT_FILE_PROMPT: &str = "Describe the attached file.";

/// Route a caption to an ask mode. Media is only processed when the caption
/// starts with /ask or /search; anything else is not a request.
fn caption_mode(caption: &str) -> Option<(AskMode, String)> {
    let trimmed = caption.trim();
    for (prefix, mode) in [("/ask", AskMode::Ask), ("/search", AskMode::Search)] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some((mode, rest.trim().to_string()));
            }
        }
    }
    None
}

/// Photos and documents (images or PDFs). The caption may carry the
/// question; in groups it must start with /ask or /search.
pub async fn handle_media(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let user_id = UserId(user.id.0 as i64);
    let chat_id = msg.chat.id;
    let caption = msg.caption().unwrap_or("");

    let Some((mode, prompt)) = caption_mode(caption) else {
        // Unaddressed group media stays silent; private chats get a pointer.
        if msg.chat.is_private() {
            bot.send_message(chat_id, formatting::media_usage_hint()).await?;
        }
        return Ok(());
    };

    // Refuse over-quota users before downloading anything.
    match state.chat.can_send(user_id).await {
        Ok(true) => {}
        Ok(false) => {
            bot.send_message(chat_id, formatting::user_message(&Error::QuotaExceeded))
                .await?;
            return Ok(());
        }
        Err(err) => {
            bot.send_message(chat_id, formatting::user_message(&err))
                .await?;
            return Ok(());
        }
    }

    let attachment = match build_attachment(&bot, &msg).await {
        Ok(Some(part)) => part,
        Ok(None) => {
            bot.send_message(chat_id, "I can only read images and PDF documents.")
                .await?;
            return Ok(());
        }
        Err(err) => {
            warn!(user_id = user_id.0, error = %err, "media processing failed");
            bot.send_message(chat_id, formatting::user_message(&err))
                .await?;
            return Ok(());
        }
    };

    let text = if prompt.is_empty() {
        DEFAULT_FILE_PROMPT.to_string()
    } else {
        prompt
    };
    let content = vec![ContentPart::text(text), attachment];

    let ctx = AskContext {
        bot,
        state,
        chat_id,
        user_id,
    };
    run_ask(ctx, content, mode).await
}

/// Download the message's attachment and normalize it into a content part.
/// `Ok(None)` means an unsupported attachment type.
async fn build_attachment(bot: &Bot, msg: &Message) -> Result<Option<ContentPart>, Error> {
    if let Some(photos) = msg.photo() {
        // The last size is the largest.
        let best = photos
            .last()
            .ok_or_else(|| Error::Download("empty photo list".to_string()))?;
        let bytes = download(bot, &best.file.id).await?;
        return Ok(Some(ContentPart::image_url(files::process_image(&bytes)?)));
    }

    if let Some(doc) = msg.document() {
        let mime = doc
            .mime_type
            .as_ref()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        if mime == "application/pdf" {
            let bytes = download(bot, &doc.file.id).await?;
            let filename = doc
                .file_name
                .clone()
                .unwrap_or_else(|| "document.pdf".to_string());
            return Ok(Some(ContentPart::file(filename, files::process_pdf(&bytes)?)));
        }

        if mime.starts_with("image/") {
            let bytes = download(bot, &doc.file.id).await?;
            return Ok(Some(ContentPart::image_url(files::process_image(&bytes)?)));
        }

        return Ok(None);
    }

    Ok(None)
}

async fn download(bot: &Bot, file_id: &str) -> Result<Vec<u8>, Error> {
    let file = bot
        .get_file(file_id.to_string())
        .await
        .map_err(|e| Error::Download(format!("get_file: {e}")))?;

    let mut buf: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| Error::Download(format!("download_file: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_requires_an_ask_prefix() {
        assert_eq!(
            caption_mode("/ask what is this?"),
            Some((AskMode::Ask, "what is this?".to_string()))
        );
        assert_eq!(
            caption_mode("/search find the source"),
            Some((AskMode::Search, "find the source".to_string()))
        );
        assert_eq!(caption_mode("/ask"), Some((AskMode::Ask, String::new())));
    }

    #[test]
    fn uncaptioned_media_is_not_a_request() {
        assert!(caption_mode("").is_none());
        assert!(caption_mode("what is this?").is_none());
    }

    #[test]
    fn askme_is_not_ask() {
        assert!(caption_mode("/askme something").is_none());
    }
}
