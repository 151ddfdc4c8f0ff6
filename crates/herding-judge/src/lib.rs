//! Persuasion judge client for the Herding simulation.
//!
//! The simulation emits a [`herding_types::JudgeRequest`] whenever someone
//! talks to an agent. This crate renders it into a prompt, streams the
//! reply from a language model, and sends [`herding_types::JudgeEvent`]s
//! back: partial replies while text arrives, then one final decision or
//! failure.
//!
//! # Modules
//!
//! - [`config`] -- Environment-based configuration
//! - [`prompt`] -- `minijinja` prompt templates
//! - [`llm`] -- Streaming `OpenAI`-compatible and Anthropic backends
//! - [`parse`] -- Partial and final reply parsing
//! - [`dispatch`] -- Request fan-out, deadlines, and event emission
//! - [`error`] -- Error types

pub mod config;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;

pub use config::JudgeConfig;
pub use dispatch::Dispatcher;
pub use error::JudgeError;
pub use llm::{LlmBackend, create_backend};
pub use prompt::PromptEngine;
