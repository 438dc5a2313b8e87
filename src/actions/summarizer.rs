//! Narrative summaries of API responses.

use serde_json::Value;
use tracing::debug;

use crate::agent::LlmClient;
use crate::error::Error;
use crate::Result;

use super::ActionDescriptor;

/// Cap on response text embedded in the summary prompt.
const MAX_RESPONSE_CHARS: usize = 60_000;

/// Build the summary prompt for a response body.
pub fn build_prompt(action: &ActionDescriptor, body: &Value) -> String {
    let mut data = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    if data.len() > MAX_RESPONSE_CHARS {
        let mut cut = MAX_RESPONSE_CHARS;
        while !data.is_char_boundary(cut) {
            cut -= 1;
        }
        data.truncate(cut);
        data.push_str("\n... [truncated]");
    }

    format!(
        r#"# Task
You received this data from the Elfa API "{name}" endpoint ({description}).

{instruction}

Write a concise, conversational answer for the user. Do not invent data that is not present.

## Data
{data}"#,
        name = action.name,
        description = action.description,
        instruction = action.summary_instruction,
        data = data,
    )
}

/// Generate the narrative for `body`. Model output is returned verbatim.
pub async fn summarize<C: LlmClient + ?Sized>(
    llm: &C,
    action: &ActionDescriptor,
    body: &Value,
) -> Result<String> {
    let prompt = build_prompt(action, body);
    debug!("Summary prompt for {}: {} chars", action.name, prompt.len());

    llm.generate_text(&prompt)
        .await
        .map_err(|e| Error::Summarization(e.to_string()))
}
