use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Subscription tier. `lite` is the lazy-created default; `plus` is paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Lite,
    Plus,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Lite => "lite",
            Tier::Plus => "plus",
        }
    }
}

/// Message author role, as sent to the completion API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One typed part of a message body (OpenRouter wire shape).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    File { file: FileAttachment },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    pub fn file(filename: impl Into<String>, file_data: impl Into<String>) -> Self {
        ContentPart::File {
            file: FileAttachment {
                filename: filename.into(),
                file_data: file_data.into(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub filename: String,
    /// Inline `data:` URL carrying the (base64) file bytes.
    pub file_data: String,
}

/// Message content is either a bare string (system prompts) or a list of
/// typed parts (user/assistant turns).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One entry of the ordered message list sent to the completion API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(prompt: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(prompt.into()),
        }
    }

    pub fn parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }
}

/// One row of the remote `users` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: i64,
    pub tier: Tier,
    pub system_prompt: Option<String>,
    pub current_model: String,
    pub daily_count: i64,
    pub monthly_count: i64,
    pub last_daily_reset: NaiveDate,
    pub last_monthly_reset: NaiveDate,
    #[serde(default)]
    pub subscription_end_date: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Default row for a user seen for the first time.
    pub fn new_default(user_id: UserId, model: &str, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.0,
            tier: Tier::Lite,
            system_prompt: None,
            current_model: model.to_string(),
            daily_count: 0,
            monthly_count: 0,
            last_daily_reset: today,
            last_monthly_reset: today,
            subscription_end_date: None,
        }
    }
}

/// Partial update for a `users` row. `None` fields are left untouched;
/// `system_prompt: Some(None)` writes SQL NULL.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_daily_reset: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_monthly_reset: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<Option<DateTime<Utc>>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.tier.is_none()
            && self.system_prompt.is_none()
            && self.current_model.is_none()
            && self.daily_count.is_none()
            && self.monthly_count.is_none()
            && self.last_daily_reset.is_none()
            && self.last_monthly_reset.is_none()
            && self.subscription_end_date.is_none()
    }
}

/// One row of the remote `user_context` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: i64,
    pub user_id: i64,
    pub role: Role,
    pub content: Vec<ContentPart>,
    pub created_at: DateTime<Utc>,
}

/// One row of the append-only `payments` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub user_id: i64,
    pub telegram_payment_charge_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Search-augmentation plugin descriptor (OpenRouter `plugins` entry).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPlugin {
    pub id: String,
    pub max_results: u32,
    pub search_prompt: String,
}
