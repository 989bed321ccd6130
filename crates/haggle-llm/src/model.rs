//! The chat model contract and its construction point.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::anthropic::AnthropicChat;
use crate::config::{ChatBackend, ChatConfig};
use crate::error::ChatError;
use crate::message::ChatMessage;
use crate::openai::OpenAiChat;
use crate::stub::StubChat;

/// Per-request timeout for live backends.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A chat-completion backend.
///
/// Engine code holds this as `Arc<dyn ChatModel>` and treats every backend
/// identically; the stub satisfies the same contract as the live APIs.
#[async_trait]
pub trait ChatModel: std::fmt::Debug + Send + Sync {
    /// Produces a completion for the given message sequence.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Constructs the model a config describes.
///
/// The single construction point: a live backend without a credential fails
/// here, before any negotiation starts.
///
/// # Errors
///
/// Returns [`ChatError::Unconfigured`] when a live backend has no API key,
/// or [`ChatError::Http`] when the HTTP client cannot be built.
pub fn build_chat_model(config: &ChatConfig) -> Result<Arc<dyn ChatModel>, ChatError> {
    match config.backend {
        ChatBackend::OpenAi => Ok(Arc::new(OpenAiChat::new(config)?)),
        ChatBackend::Anthropic => Ok(Arc::new(AnthropicChat::new(config)?)),
        ChatBackend::Stub => Ok(Arc::new(StubChat::new())),
    }
}
