//! Static tier → model/quota tables.
//!
//! `plus` is a strict superset of `lite`: everything a free user can reach,
//! a paying user can reach too.

use crate::domain::{SearchPlugin, Tier};

pub const DEFAULT_MODEL: &str = "openai/gpt-4.1";

/// Model used by `/search` mode, independent of the user's chosen model.
pub const SEARCH_MODEL: &str = "google/gemini-2.5-flash";

const LITE_MODELS: &[&str] = &["openai/gpt-4.1", "google/gemini-2.5-flash"];

const PLUS_MODELS: &[&str] = &[
    "openai/gpt-4.1",
    "google/gemini-2.5-flash",
    "anthropic/claude-sonnet-4",
    "google/gemini-2.5-pro",
];

/// Daily/monthly message allowance for a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageLimits {
    pub daily: i64,
    pub monthly: i64,
}

pub fn limits(tier: Tier) -> UsageLimits {
    match tier {
        Tier::Lite => UsageLimits {
            daily: 20,
            monthly: 100,
        },
        Tier::Plus => UsageLimits {
            daily: 100,
            monthly: 1000,
        },
    }
}

pub fn available_models(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Lite => LITE_MODELS,
        Tier::Plus => PLUS_MODELS,
    }
}

pub fn is_model_allowed(tier: Tier, model: &str) -> bool {
    available_models(tier).contains(&model)
}

/// Web-search plugin attached to `/search` requests. The prompt steers the
/// model away from markdown because replies are sent as plain Telegram text.
pub fn web_search_plugin() -> SearchPlugin {
    SearchPlugin {
        id: "web".to_string(),
        max_results: 3,
        search_prompt: "Here are relevant web search results (provide information without any \
                        markdown formatting, use plain text only with bare URLs when needed):"
            .to_string(),
    }
}
