//! Anthropic messages API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::message::{ChatMessage, ChatRole};
use crate::model::{ChatModel, REQUEST_TIMEOUT};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Chat model over the Anthropic messages API.
pub struct AnthropicChat {
    client: reqwest::Client,
    model: String,
    api_key: String,
    temperature: f64,
    max_tokens: u32,
}

impl AnthropicChat {
    /// Builds the backend from a config.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Unconfigured`] when the config carries no API
    /// key.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ChatError::Unconfigured("ANTHROPIC_API_KEY is not set".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

impl std::fmt::Debug for AnthropicChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicChat")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

/// Splits system messages out of the sequence; the messages API takes them
/// as a top-level field rather than in the turn list.
fn partition_system(messages: &[ChatMessage]) -> (Option<String>, Vec<WireMessage<'_>>) {
    let system_parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    let turns = messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        })
        .collect();

    (system, turns)
}

#[async_trait]
impl ChatModel for AnthropicChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let (system, turns) = partition_system(messages);
        let body = MessagesRequest {
            model: &self.model,
            system,
            messages: turns,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, message_count = messages.len(), "anthropic completion request");

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: raw,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&raw)
            .map_err(|err| ChatError::malformed(format!("response decode failed: {err}"), raw))?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| ChatError::malformed("response carried no content", String::new()))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_messages_lift_out_of_turn_list() {
        let messages = vec![
            ChatMessage::system("you are a buyer"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
        ];

        let (system, turns) = partition_system(&messages);
        assert_eq!(system.as_deref(), Some("you are a buyer"));
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[1].role, "assistant");
    }

    #[test]
    fn multiple_system_messages_join() {
        let messages = vec![
            ChatMessage::system("part one"),
            ChatMessage::system("part two"),
            ChatMessage::user("go"),
        ];

        let (system, turns) = partition_system(&messages);
        assert_eq!(system.as_deref(), Some("part one\n\npart two"));
        assert_eq!(turns.len(), 1);
    }

    #[test]
    fn no_system_yields_none() {
        let messages = vec![ChatMessage::user("hello")];
        let (system, _) = partition_system(&messages);
        assert!(system.is_none());
    }

    #[test]
    fn response_shape_deserializes() {
        let raw = r#"{"content":[{"type":"text","text":"hello"}],"role":"assistant"}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content[0].text, "hello");
    }
}
