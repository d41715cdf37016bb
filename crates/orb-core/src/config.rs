use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: String,
    pub openrouter_api_key: String,
    pub supabase_url: String,
    pub supabase_service_role_key: String,

    // Conversation
    pub context_size: usize,

    // Subscription
    pub subscription_price_stars: u32,
    pub subscription_days: i64,

    // Timeouts
    pub store_timeout: Duration,
    pub completion_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let openrouter_api_key = require("OPENROUTER_API_KEY")?;
        let supabase_url = require("SUPABASE_URL")?.trim_end_matches('/').to_string();
        let supabase_service_role_key = require("SUPABASE_SERVICE_ROLE_KEY")?;

        let context_size = env_usize("CONTEXT_SIZE").unwrap_or(10);
        let subscription_price_stars = env_u32("SUBSCRIPTION_PRICE_STARS").unwrap_or(300);
        let subscription_days = env_i64("SUBSCRIPTION_DAYS").unwrap_or(30);

        let store_timeout = Duration::from_millis(env_u64("STORE_TIMEOUT_MS").unwrap_or(10_000));
        let completion_timeout =
            Duration::from_millis(env_u64("COMPLETION_TIMEOUT_MS").unwrap_or(120_000));

        Ok(Self {
            telegram_bot_token,
            openrouter_api_key,
            supabase_url,
            supabase_service_role_key,
            context_size,
            subscription_price_stars,
            subscription_days,
            store_timeout,
            completion_timeout,
        })
    }
}

fn require(key: &str) -> Result<String> {
    env_str(key).and_then(non_empty).ok_or_else(|| {
        Error::Config(format!("{key} environment variable is required"))
    })
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
