//! Agent module — conversation and model plumbing.
//!
//! This module contains:
//! - Message types (conversation messages, action messages)
//! - LLM client trait and implementations
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

mod message;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use llm::{GeminiClient, LlmClient, ProviderRegistry};
pub use message::{format_transcript, ActionMessage, Message, Role};
