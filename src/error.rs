//! Error types for elfa-actions

use thiserror::Error;

/// Result type alias for elfa-actions operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running an action
#[derive(Error, Debug)]
pub enum Error {
    /// Required Elfa settings are missing or empty.
    #[error("Missing required configuration: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    /// The model's parameter object failed the schema check.
    #[error("Invalid extraction: {}", problems.join("; "))]
    InvalidExtraction { problems: Vec<String> },

    /// Network failure, non-2xx status, or unreadable body from the Elfa API.
    #[error("{}", format_upstream(*status, message))]
    Upstream { status: Option<u16>, message: String },

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure. The request URL is stripped on conversion.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("{0}")]
    Other(String),
}

fn format_upstream(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Elfa API error ({code}): {message}"),
        None => format!("Elfa API request failed: {message}"),
    }
}

impl Error {
    /// Shorthand for an upstream error without an HTTP status.
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}
