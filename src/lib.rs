//! elfa-actions - conversational actions for the Elfa social analytics API
//!
//! This library turns free-text conversation into calls against the Elfa
//! API: a language model extracts typed parameters, one HTTP GET is
//! issued, and the JSON response is summarized back into text.

pub mod actions;
pub mod adapters;
pub mod agent;
pub mod config;
pub mod error;
pub mod ui;

pub use actions::{ActionContext, ActionDescriptor, ActionOrchestrator, ActionOutcome, ActionRegistry};
pub use error::{Error, Result};
