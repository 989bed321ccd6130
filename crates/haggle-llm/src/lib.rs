//! # haggle-llm
//!
//! Chat-completion backends for negotiation agents.
//!
//! This crate provides:
//!
//! - **Model contract**: [`ChatModel`], the trait engine code holds as
//!   `Arc<dyn ChatModel>`
//! - **Live backends**: [`OpenAiChat`] and [`AnthropicChat`] over HTTP
//! - **Deterministic backend**: [`StubChat`] with keyword-driven replies for
//!   tests and offline operation
//! - **Configuration**: [`ChatConfig`] resolved once at the orchestration
//!   entry point, never from ambient environment reads deeper in the engine
//! - **Structured output**: [`parse_structured`] for pulling a typed JSON
//!   payload out of loosely formatted model text

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod config;
pub mod error;
pub mod message;
pub mod model;
pub mod openai;
pub mod parse;
pub mod stub;

pub use anthropic::AnthropicChat;
pub use config::{ChatBackend, ChatConfig};
pub use error::ChatError;
pub use message::{ChatMessage, ChatRole};
pub use model::{build_chat_model, ChatModel};
pub use openai::OpenAiChat;
pub use parse::{extract_json_span, parse_structured};
pub use stub::StubChat;
