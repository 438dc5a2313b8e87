//! Parameter extraction from conversation text.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::agent::{format_transcript, LlmClient, Message};
use crate::Result;

use super::schema::ExtractedParams;
use super::ActionDescriptor;

/// Maximum history messages to include in the prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Turns recent conversation into validated action parameters.
#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    history_window: usize,
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ParameterExtractor {
    pub fn new(history_window: usize) -> Self {
        Self {
            history_window: history_window.max(1),
        }
    }

    /// Run one extraction round-trip and validate the result.
    ///
    /// Actions without parameters never reach the model.
    pub async fn extract<C: LlmClient + ?Sized>(
        &self,
        llm: &C,
        action: &ActionDescriptor,
        history: &[Message],
    ) -> Result<ExtractedParams> {
        if action.schema.is_empty() {
            return Ok(ExtractedParams::default());
        }

        let prompt = self.build_prompt(action, history, Utc::now());
        debug!("Extraction prompt for {}: {} chars", action.name, prompt.len());

        let candidate = llm.generate_object(&prompt, &action.schema.json_schema()).await?;
        debug!("Extraction candidate for {}: {}", action.name, candidate);

        action.schema.validate(&candidate).map_err(|e| {
            warn!("Extraction for {} rejected: {}", action.name, e);
            e
        })
    }

    /// Build the extraction instruction for `action`.
    pub fn build_prompt(
        &self,
        action: &ActionDescriptor,
        history: &[Message],
        now: DateTime<Utc>,
    ) -> String {
        let windowed = if history.len() > self.history_window {
            &history[history.len() - self.history_window..]
        } else {
            history
        };

        format!(
            r#"# Task
Extract the parameters for the "{name}" action ({description}) from the conversation below.

## Current Time
{iso} (unix seconds: {unix})

## Parameters
{fields}

## Example
{example}

## Conversation
{transcript}

Respond with a single JSON object containing only the parameters above. Use the most recent request in the conversation. Omit optional parameters the user did not mention. Express times as unix timestamps in seconds."#,
            name = action.name,
            description = action.description,
            iso = now.to_rfc3339_opts(SecondsFormat::Secs, true),
            unix = now.timestamp(),
            fields = action.schema.describe(),
            example = action.example,
            transcript = format_transcript(windowed),
        )
    }
}
