use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// The single seam to the external text model. Everything provider-shaped
/// (question synthesis, open-answer evaluation, insight synthesis) goes
/// through this trait so the whole pipeline can run against a stub.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7
        });

        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("OpenAI API error {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Provider("Invalid OpenAI response format".to_string()))
    }
}

/// Result of a step that consults the provider but always has a
/// deterministic local fallback. The payload is the same either way;
/// the variant records where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Provider(T),
    Fallback(T),
}

impl<T> Sourced<T> {
    /// `parsed` is the provider path's usable output, already validated;
    /// `None` means the provider was absent, failed, or returned something
    /// unusable, and the fallback is built instead.
    pub fn or_fallback(parsed: Option<T>, fallback: impl FnOnce() -> T) -> Self {
        match parsed {
            Some(value) => Sourced::Provider(value),
            None => Sourced::Fallback(fallback()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Provider(value) | Sourced::Fallback(value) => value,
        }
    }
}
