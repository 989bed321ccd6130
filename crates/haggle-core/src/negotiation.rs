//! Negotiation threads and their messages.
//!
//! A [`Negotiation`] is one bilateral thread between a buyer agent and a
//! provider agent. Messages are append-only; the turn marker flips once per
//! recorded message and is owned by the store layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Which side of a negotiation an agent speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The buyer side, which opens the thread.
    Buyer,
    /// The provider side, which answers.
    Provider,
}

impl Role {
    /// Returns the role as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Provider => "provider",
        }
    }

    /// Returns the other side of the table.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buyer => Self::Provider,
            Self::Provider => Self::Buyer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "provider" => Ok(Self::Provider),
            other => Err(CoreError::InvalidValue {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle state of a negotiation thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationStatus {
    /// The thread accepts new messages and proposals.
    #[default]
    Active,
    /// A proposal was accepted; the thread is closed.
    Completed,
    /// A party withdrew; the thread is closed.
    Cancelled,
}

impl NegotiationStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true once the thread has reached a closed state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NegotiationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::InvalidValue {
                kind: "negotiation status",
                value: other.to_string(),
            }),
        }
    }
}

/// A bilateral negotiation thread between one buyer and one provider agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negotiation {
    /// Opaque unique identifier.
    pub id: String,
    /// Agent id of the buyer side.
    pub buyer_agent_id: String,
    /// Agent id of the provider side.
    pub provider_agent_id: String,
    /// Job this thread negotiates, when one exists.
    pub job_id: Option<String>,
    /// Current lifecycle state.
    pub status: NegotiationStatus,
    /// Whose turn it is to speak next. Flips once per recorded message.
    pub current_turn: Role,
    /// When the thread was opened.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// Set when the thread reaches a terminal status, cleared otherwise.
    pub ended_at: Option<DateTime<Utc>>,
    /// Closing summary, set on the terminal transition.
    pub summary: Option<String>,
}

impl Negotiation {
    /// Creates a new active thread with the buyer holding the first turn.
    #[must_use]
    pub fn new(
        buyer_agent_id: impl Into<String>,
        provider_agent_id: impl Into<String>,
        job_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            buyer_agent_id: buyer_agent_id.into(),
            provider_agent_id: provider_agent_id.into(),
            job_id,
            status: NegotiationStatus::Active,
            current_turn: Role::Buyer,
            created_at: now,
            updated_at: now,
            ended_at: None,
            summary: None,
        }
    }

    /// Returns true while the thread accepts messages and proposals.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, NegotiationStatus::Active)
    }

    /// Returns the agent id speaking for the given role.
    #[must_use]
    pub fn agent_for(&self, role: Role) -> &str {
        match role {
            Role::Buyer => &self.buyer_agent_id,
            Role::Provider => &self.provider_agent_id,
        }
    }
}

/// Classification of a message within a thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// An ordinary conversational turn.
    #[default]
    Message,
    /// A turn that carries a concrete deal proposal.
    Proposal,
    /// The closing message of a cancelled thread.
    Cancellation,
}

impl MessageKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Proposal => "proposal",
            Self::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Self::Message),
            "proposal" => Ok(Self::Proposal),
            "cancellation" => Ok(Self::Cancellation),
            other => Err(CoreError::InvalidValue {
                kind: "message kind",
                value: other.to_string(),
            }),
        }
    }
}

/// One recorded utterance in a negotiation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationMessage {
    /// Opaque unique identifier.
    pub id: String,
    /// Thread this message belongs to.
    pub negotiation_id: String,
    /// Agent id of the speaker.
    pub sender: String,
    /// Which side the speaker was on.
    pub sender_role: Role,
    /// Literal message text.
    pub content: String,
    /// Message classification.
    pub kind: MessageKind,
    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}

impl NegotiationMessage {
    /// Creates a new message record.
    #[must_use]
    pub fn new(
        negotiation_id: impl Into<String>,
        sender: impl Into<String>,
        sender_role: Role,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            negotiation_id: negotiation_id.into(),
            sender: sender.into(),
            sender_role,
            content: content.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Role tests
    // ==========================================================================

    #[test]
    fn role_opposite_flips_both_ways() {
        assert_eq!(Role::Buyer.opposite(), Role::Provider);
        assert_eq!(Role::Provider.opposite(), Role::Buyer);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Buyer).unwrap(), "\"buyer\"");
        assert_eq!(
            serde_json::to_string(&Role::Provider).unwrap(),
            "\"provider\""
        );
    }

    #[test]
    fn role_from_str_roundtrip() {
        for role in [Role::Buyer, Role::Provider] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("referee".parse::<Role>().is_err());
    }

    // ==========================================================================
    // NegotiationStatus tests
    // ==========================================================================

    #[test]
    fn status_terminality() {
        assert!(!NegotiationStatus::Active.is_terminal());
        assert!(NegotiationStatus::Completed.is_terminal());
        assert!(NegotiationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_from_str_roundtrip() {
        for status in [
            NegotiationStatus::Active,
            NegotiationStatus::Completed,
            NegotiationStatus::Cancelled,
        ] {
            assert_eq!(
                status.as_str().parse::<NegotiationStatus>().unwrap(),
                status
            );
        }
        assert!("paused".parse::<NegotiationStatus>().is_err());
    }

    // ==========================================================================
    // Negotiation tests
    // ==========================================================================

    #[test]
    fn negotiation_new_starts_active_on_buyer_turn() {
        let negotiation = Negotiation::new("buyer-1", "provider-1", Some("job-1".into()));

        assert_eq!(negotiation.status, NegotiationStatus::Active);
        assert_eq!(negotiation.current_turn, Role::Buyer);
        assert!(negotiation.is_active());
        assert!(negotiation.ended_at.is_none());
        assert!(negotiation.summary.is_none());
        assert_eq!(negotiation.job_id.as_deref(), Some("job-1"));
    }

    #[test]
    fn negotiation_agent_for_role() {
        let negotiation = Negotiation::new("buyer-1", "provider-1", None);

        assert_eq!(negotiation.agent_for(Role::Buyer), "buyer-1");
        assert_eq!(negotiation.agent_for(Role::Provider), "provider-1");
    }

    #[test]
    fn negotiation_ids_are_unique() {
        let a = Negotiation::new("b", "p", None);
        let b = Negotiation::new("b", "p", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn negotiation_serialization_roundtrip() {
        let negotiation = Negotiation::new("buyer-1", "provider-1", None);
        let json = serde_json::to_string(&negotiation).unwrap();
        let parsed: Negotiation = serde_json::from_str(&json).unwrap();
        assert_eq!(negotiation, parsed);
    }

    // ==========================================================================
    // NegotiationMessage tests
    // ==========================================================================

    #[test]
    fn message_new() {
        let message = NegotiationMessage::new(
            "neg-1",
            "buyer-1",
            Role::Buyer,
            "hello",
            MessageKind::Message,
        );

        assert_eq!(message.negotiation_id, "neg-1");
        assert_eq!(message.sender, "buyer-1");
        assert_eq!(message.sender_role, Role::Buyer);
        assert_eq!(message.kind, MessageKind::Message);
    }

    #[test]
    fn message_kind_from_str_roundtrip() {
        for kind in [
            MessageKind::Message,
            MessageKind::Proposal,
            MessageKind::Cancellation,
        ] {
            assert_eq!(kind.as_str().parse::<MessageKind>().unwrap(), kind);
        }
        assert!("aside".parse::<MessageKind>().is_err());
    }
}
