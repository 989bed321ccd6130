//! Deterministic offline chat backend.
//!
//! Replies are keyed off markers in the last user message, in the same way
//! for every run, so negotiation flows stay reproducible in tests and in
//! degraded operation. The reply texts are chosen to classify cleanly:
//! the acceptance reply carries an acceptance token and the decline reply a
//! rejection token, never both.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ChatError;
use crate::message::{ChatMessage, ChatRole};
use crate::model::ChatModel;

/// Proposals below this price get declined by the stub.
pub const MIN_ACCEPTABLE_PRICE: i64 = 50;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)").unwrap_or_else(|_| unreachable!()));

const OPENING_REPLY: &str = "Hello! I'm reaching out about a job I'd like to line up. \
     Could you walk me through how you would approach it and what it would cost?";

const DISCUSSION_REPLY: &str = "That generally sounds workable. I have some room to be \
     flexible on the details if we can line up the schedule and the price.";

const ACCEPT_REPLY: &str = "ACCEPT. The price and scope work for me, happy to proceed.";

const DECLINE_REPLY: &str = "I must decline this offer. That price is below what I can \
     take the job on for.";

/// Keyword-driven deterministic chat model.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubChat;

impl StubChat {
    /// Creates the stub backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn reply_to(prompt: &str) -> &'static str {
        let lowered = prompt.to_lowercase();

        if lowered.contains("accept or reject") {
            let offered = PRICE_RE
                .captures(prompt)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok());
            return match offered {
                Some(price) if price < MIN_ACCEPTABLE_PRICE => DECLINE_REPLY,
                _ => ACCEPT_REPLY,
            };
        }

        if lowered.contains("open the conversation") {
            return OPENING_REPLY;
        }

        DISCUSSION_REPLY
    }
}

#[async_trait]
impl ChatModel for StubChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map_or("", |m| m.content.as_str());
        Ok(Self::reply_to(prompt).to_string())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ask(prompt: &str) -> String {
        StubChat::new()
            .complete(&[ChatMessage::user(prompt)])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reasonable_proposal_gets_accepted() {
        let reply = ask(
            "A deal was proposed at $240 for a sink repair. \
             Reply with ACCEPT or REJECT first, then one sentence of reasoning.",
        )
        .await;
        assert!(reply.starts_with("ACCEPT"));
    }

    #[tokio::test]
    async fn lowball_proposal_gets_declined() {
        let reply = ask(
            "A deal was proposed at $10 for a full renovation. \
             Reply with ACCEPT or REJECT first.",
        )
        .await;
        assert!(reply.contains("decline"));
        assert!(!reply.to_lowercase().contains("accept"));
    }

    #[tokio::test]
    async fn proposal_without_price_gets_accepted() {
        let reply = ask("Reply with ACCEPT or REJECT for this scope-only deal.").await;
        assert!(reply.starts_with("ACCEPT"));
    }

    #[tokio::test]
    async fn opening_marker_yields_greeting() {
        let reply = ask("You are starting a negotiation. Open the conversation politely.").await;
        assert!(reply.starts_with("Hello"));
    }

    #[tokio::test]
    async fn anything_else_yields_discussion() {
        let reply = ask("The provider said they can come on Tuesday. Respond in kind.").await;
        assert_eq!(reply, DISCUSSION_REPLY);
    }

    #[tokio::test]
    async fn empty_history_still_replies() {
        let reply = StubChat::new().complete(&[]).await.unwrap();
        assert_eq!(reply, DISCUSSION_REPLY);
    }

    #[tokio::test]
    async fn same_prompt_same_reply() {
        let first = ask("How soon can you start $300?").await;
        let second = ask("How soon can you start $300?").await;
        assert_eq!(first, second);
    }
}
