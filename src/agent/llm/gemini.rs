//! Gemini LLM client implementation (API key authentication).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::{parse_json_reply, GeminiResponse, LlmClient};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client with API key.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: GEMINI_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different models endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_url(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, prompt: &str, response_schema: Option<Value>) -> Result<GeminiResponse> {
        let mut generation_config = json!({
            "temperature": 0.2,
            "maxOutputTokens": 8192
        });

        if let Some(schema) = response_schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = schema;
        }

        let request = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }],
            "generationConfig": generation_config
        });

        debug!("Gemini request: {} prompt chars", prompt.len());

        let response = self
            .client
            .post(self.build_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(Error::Llm(format!("Gemini API error: {error_text}")));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                "Gemini usage: prompt={:?} completion={:?} total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }
        Ok(gemini_response)
    }
}

/// Convert a JSON Schema into the OpenAPI subset Gemini accepts.
///
/// Type names are upper-cased and keywords Gemini rejects are dropped.
pub fn to_gemini_schema(schema: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };

    let mut out = Map::new();
    for (key, value) in obj {
        match key.as_str() {
            "type" => {
                if let Some(t) = value.as_str() {
                    out.insert(key.clone(), json!(t.to_uppercase()));
                }
            }
            "description" | "required" | "enum" | "nullable" | "format" => {
                out.insert(key.clone(), value.clone());
            }
            "properties" => {
                let props: Map<String, Value> = value
                    .as_object()
                    .map(|props| {
                        props
                            .iter()
                            .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                            .collect()
                    })
                    .unwrap_or_default();
                out.insert(key.clone(), Value::Object(props));
            }
            "items" => {
                out.insert(key.clone(), to_gemini_schema(value));
            }
            _ => {}
        }
    }
    Value::Object(out)
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let response = self.generate(prompt, None).await?;
        response
            .text()
            .ok_or_else(|| Error::Llm("No candidates in response".to_string()))
    }

    async fn generate_object(&self, prompt: &str, schema: &Value) -> Result<Value> {
        let response = self.generate(prompt, Some(to_gemini_schema(schema))).await?;
        let text = response
            .text()
            .ok_or_else(|| Error::Llm("No candidates in response".to_string()))?;
        parse_json_reply(&text)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
