//! OpenRouter adapter (chat completions).

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use orb_core::{
    domain::{ChatMessage, SearchPlugin},
    ports::CompletionClient,
    Error, Result,
};

const COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    api_key: String,
    http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            api_key: api_key.into(),
            http,
        }
    }
}

fn build_payload(
    model: &str,
    messages: &[ChatMessage],
    plugins: Option<&[SearchPlugin]>,
) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "model": model,
        "messages": messages,
    });
    if let Some(plugins) = plugins {
        payload["plugins"] = serde_json::json!(plugins);
    }
    payload
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        plugins: Option<&[SearchPlugin]>,
    ) -> Result<String> {
        debug!(model, messages = messages.len(), "completion request");

        let resp = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&build_payload(model, messages, plugins))
            .send()
            .await
            .map_err(|e| Error::Completion(format!("openrouter request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "openrouter completion failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Completion(format!("openrouter json error: {e}")))?;

        let text = v
            .pointer("/choices/0/message/content")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();

        if text.trim().is_empty() {
            return Err(Error::Completion(
                "openrouter returned an empty completion".to_string(),
            ));
        }

        Ok(text)
    }
}
