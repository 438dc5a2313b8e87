//! LLM client abstraction layer.
//!
//! This module provides:
//! - [`LlmClient`] trait for swappable LLM providers
//! - [`ProviderRegistry`] for dynamic provider creation
//! - Concrete implementation: Gemini API key
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `openai.rs`)
//! 2. Implement `LlmClient` trait
//! 3. Add to `ProviderRegistry::create()`
//! 4. Add config fields in `config.rs`

mod types;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::Result;

pub use types::*;

pub mod gemini;

pub use gemini::GeminiClient;

/// LLM client trait — swappable provider abstraction.
///
/// The actions need two capabilities: free text, and an object shaped by
/// a JSON Schema.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate free text for a prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Generate a JSON object constrained by `schema`.
    ///
    /// The result is only a candidate; callers validate it.
    async fn generate_object(&self, prompt: &str, schema: &Value) -> Result<Value>;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        (**self).generate_text(prompt).await
    }

    async fn generate_object(&self, prompt: &str, schema: &Value) -> Result<Value> {
        (**self).generate_object(prompt, schema).await
    }

    fn default_model(&self) -> &str {
        (**self).default_model()
    }
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        (**self).generate_text(prompt).await
    }

    async fn generate_object(&self, prompt: &str, schema: &Value) -> Result<Value> {
        (**self).generate_object(prompt, schema).await
    }

    fn default_model(&self) -> &str {
        (**self).default_model()
    }
}

/// Provider registry — creates LLM clients dynamically.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config)?;
/// let summary = client.generate_text("Summarize ...").await?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create an LLM client from configuration.
    ///
    /// Supported providers:
    /// - `"gemini"`: Gemini API with API key authentication
    pub fn create(config: &Config) -> Result<Box<dyn LlmClient>> {
        match config.provider.as_str() {
            "gemini" => {
                if config.gemini_api_key.trim().is_empty() {
                    return Err(Error::Config(
                        "gemini_api_key is not set (run 'elfa onboard')".to_string(),
                    ));
                }
                let client = GeminiClient::new(&config.gemini_api_key, &config.model);
                Ok(Box::new(client))
            }
            other => Err(Error::Config(format!(
                "Unknown provider: {other} (available: {})",
                Self::available().join(", ")
            ))),
        }
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["gemini"]
    }
}

fn fenced_block() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

/// Pull a JSON object out of model text.
///
/// Accepts bare JSON, a fenced ```json block, or an object embedded in
/// surrounding prose.
pub fn parse_json_reply(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(caps) = fenced_block().and_then(|re| re.captures(trimmed)) {
        if let Ok(value) = serde_json::from_str::<Value>(&caps[1]) {
            return Ok(value);
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str(&trimmed[start..=end]).map_err(|e| {
                Error::Llm(format!("Model returned malformed JSON: {e}"))
            })
        }
        _ => Err(Error::Llm("Model reply contains no JSON object".to_string())),
    }
}

/// Scripted reply for [`FakeLlmClient`].
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    Object(Value),
    Fail(String),
}

/// Fake LLM client for testing.
#[cfg(test)]
pub struct FakeLlmClient {
    replies: std::sync::Mutex<std::collections::VecDeque<FakeReply>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl FakeLlmClient {
    /// Create with predefined replies, consumed in order.
    pub fn new(replies: Vec<FakeReply>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Extraction result followed by a summary.
    pub fn extract_then_summarize(object: Value, summary: &str) -> Self {
        Self::new(vec![
            FakeReply::Object(object),
            FakeReply::Text(summary.to_string()),
        ])
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, prompt: &str) -> Result<FakeReply> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Llm("No more fake responses".to_string()))
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        match self.next(prompt)? {
            FakeReply::Text(text) => Ok(text),
            FakeReply::Object(value) => Ok(value.to_string()),
            FakeReply::Fail(msg) => Err(Error::Llm(msg)),
        }
    }

    async fn generate_object(&self, prompt: &str, _schema: &Value) -> Result<Value> {
        match self.next(prompt)? {
            FakeReply::Object(value) => Ok(value),
            FakeReply::Text(text) => parse_json_reply(&text),
            FakeReply::Fail(msg) => Err(Error::Llm(msg)),
        }
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }
}
