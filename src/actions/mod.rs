//! Actions module - Elfa API capabilities
//!
//! Each action is plain data (an [`ActionDescriptor`]); one generic
//! [`ActionOrchestrator`] runs any of them:
//!
//! 1. resolve the Elfa base URL and API key
//! 2. extract parameters from the conversation with the model
//! 3. GET the endpoint
//! 4. summarize the JSON response with the model

pub mod catalog;
mod dispatcher;
mod extractor;
mod orchestrator;
mod schema;
pub mod summarizer;

pub use dispatcher::{ApiResponse, RequestDispatcher, API_KEY_HEADER};
pub use extractor::{ParameterExtractor, DEFAULT_HISTORY_WINDOW};
pub use orchestrator::{ActionContext, ActionOrchestrator, ActionOutcome};
pub use schema::{
    render_query_value, DefaultValue, ExtractedParams, ExtractionSchema, FieldKind, FieldSpec,
};

/// Static description of one Elfa API action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionDescriptor {
    /// Unique action name
    pub name: &'static str,
    /// Trigger phrases that route a message to this action
    pub similes: &'static [&'static str],
    pub description: &'static str,
    /// Endpoint path under the base URL
    pub path: &'static str,
    pub schema: ExtractionSchema,
    /// Noun used in messages ("Invalid top mentions parameters ...")
    pub subject: &'static str,
    /// Gerund phrase used in errors ("Error retrieving top mentions: ...")
    pub activity: &'static str,
    /// Worked example shown to the extractor
    pub example: &'static str,
    /// What the summary should highlight
    pub summary_instruction: &'static str,
}

/// Immutable set of actions handed to the host.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    actions: Vec<ActionDescriptor>,
}

impl ActionRegistry {
    /// Build a registry, rejecting duplicate names.
    pub fn new(actions: Vec<ActionDescriptor>) -> crate::Result<Self> {
        for (i, action) in actions.iter().enumerate() {
            if actions[..i].iter().any(|a| a.name == action.name) {
                return Err(crate::error::Error::Config(format!(
                    "Duplicate action name: {}",
                    action.name
                )));
            }
        }
        Ok(Self { actions })
    }

    /// The seven Elfa actions.
    pub fn elfa() -> Self {
        Self {
            actions: catalog::all(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Look up by name or simile, ignoring case.
    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        let wanted = normalize(name);
        self.actions.iter().find(|a| {
            normalize(a.name) == wanted || a.similes.iter().any(|s| normalize(s) == wanted)
        })
    }

    /// Pick the action whose name or simile appears in `text`.
    ///
    /// The longest matching phrase wins.
    pub fn route(&self, text: &str) -> Option<&ActionDescriptor> {
        let haystack = format!(" {} ", normalize(text));
        self.actions
            .iter()
            .filter_map(|a| {
                std::iter::once(a.name)
                    .chain(a.similes.iter().copied())
                    .map(normalize)
                    .filter(|phrase| haystack.contains(&format!(" {} ", phrase)))
                    .map(|phrase| phrase.len())
                    .max()
                    .map(|len| (len, a))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, a)| a)
    }
}

/// Lower-case, treat `_`/`-` as spaces, collapse whitespace, drop punctuation.
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c if c.is_alphanumeric() || c.is_whitespace() => c.to_ascii_lowercase(),
            _ => ' ',
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
