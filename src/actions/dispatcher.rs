//! HTTP dispatch to the Elfa API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ElfaConfig;
use crate::error::Error;
use crate::Result;

/// Header carrying the Elfa API key.
pub const API_KEY_HEADER: &str = "x-elfa-api-key";

/// Body of a successful Elfa API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body
    pub body: Value,
    /// Body text exactly as received
    pub raw: String,
}

/// Issues one GET per invocation. No retries.
#[derive(Debug, Clone, Default)]
pub struct RequestDispatcher {
    client: Client,
}

impl RequestDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with a request timeout instead of the transport default.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Join the base URL and endpoint path and attach the query.
    pub fn build_url(base_url: &str, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| Error::upstream(format!("Invalid base URL '{}': {}", base_url, e)))?;

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET `path` with `query` and return the JSON body.
    pub async fn dispatch(
        &self,
        config: &ElfaConfig,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse> {
        let url = Self::build_url(&config.base_url, path, query)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, &config.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                Error::upstream(format!("Failed to reach {}: {}", url.path(), e.without_url()))
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| Error::Upstream {
            status: Some(status.as_u16()),
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            warn!("Elfa API returned {} for {}", status, url.path());
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                message: error_message(status, &raw),
            });
        }

        let body: Value = serde_json::from_str(&raw).map_err(|e| Error::Upstream {
            status: Some(status.as_u16()),
            message: format!("Malformed JSON body: {}", e),
        })?;

        debug!("Elfa API {} returned {} bytes", url.path(), raw.len());
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
            raw,
        })
    }
}

/// Best human-readable message for a failed response.
fn error_message(status: StatusCode, raw: &str) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(raw) {
        let from_body = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .or_else(|| {
                body.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
            });
        if let Some(msg) = from_body {
            return msg.to_string();
        }
    }

    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}
