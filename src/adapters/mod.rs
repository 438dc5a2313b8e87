//! Adapters module — hosts for the action registry.
//!
//! # Supported Channels
//!
//! - **CLI** — Interactive command line interface

pub mod cli;

pub use cli::CliChannel;
