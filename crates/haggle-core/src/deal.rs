//! Deal proposals and their accept/reject lifecycle.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::JobScope;
use crate::error::CoreError;

/// Lifecycle state of a deal proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Awaiting the responder's verdict.
    #[default]
    Pending,
    /// The responder took the deal.
    Accepted,
    /// The responder turned the deal down.
    Rejected,
}

impl ProposalStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true once a verdict has been recorded.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::InvalidValue {
                kind: "proposal status",
                value: other.to_string(),
            }),
        }
    }
}

/// What a proposed deal covers. Absent fields fall back to generic wording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealScope {
    /// Free-text description of the work.
    pub description: Option<String>,
    /// Room count, when the job is spatial.
    pub rooms: Option<u32>,
    /// Additional free-form key/value detail.
    #[serde(default)]
    pub details: HashMap<String, String>,
}

impl DealScope {
    /// Creates a scope with only a description.
    #[must_use]
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            rooms: None,
            details: HashMap::new(),
        }
    }

    /// Renders the scope for summaries. Missing fields get generic wording.
    #[must_use]
    pub fn describe(&self) -> String {
        let base = self
            .description
            .as_deref()
            .unwrap_or("the proposed work")
            .to_string();
        match self.rooms {
            Some(rooms) => format!("{base} ({rooms} rooms)"),
            None => base,
        }
    }
}

impl From<&JobScope> for DealScope {
    fn from(job: &JobScope) -> Self {
        Self {
            description: Some(job.description.clone()),
            rooms: job.rooms,
            details: HashMap::new(),
        }
    }
}

/// A concrete deal proposal attached to a negotiation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationResult {
    /// Opaque unique identifier.
    pub id: String,
    /// Thread the proposal belongs to.
    pub negotiation_id: String,
    /// Agent id of the proposer.
    pub proposed_by: String,
    /// Current verdict state.
    pub status: ProposalStatus,
    /// Proposed price, positive when present.
    pub final_price: Option<i64>,
    /// What the deal covers.
    pub scope: Option<DealScope>,
    /// When the proposal was recorded.
    pub created_at: DateTime<Utc>,
    /// Set together with the verdict, absent while pending.
    pub responded_at: Option<DateTime<Utc>>,
    /// The responder's literal reply, when one was recorded.
    pub response_message: Option<String>,
}

impl NegotiationResult {
    /// Creates a new pending proposal.
    #[must_use]
    pub fn new(
        negotiation_id: impl Into<String>,
        proposed_by: impl Into<String>,
        final_price: Option<i64>,
        scope: Option<DealScope>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            negotiation_id: negotiation_id.into(),
            proposed_by: proposed_by.into(),
            status: ProposalStatus::Pending,
            final_price,
            scope,
            created_at: Utc::now(),
            responded_at: None,
            response_message: None,
        }
    }

    /// Returns true while no verdict has been recorded.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ProposalStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // ProposalStatus tests
    // ==========================================================================

    #[test]
    fn proposal_status_settled() {
        assert!(!ProposalStatus::Pending.is_settled());
        assert!(ProposalStatus::Accepted.is_settled());
        assert!(ProposalStatus::Rejected.is_settled());
    }

    #[test]
    fn proposal_status_from_str_roundtrip() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Accepted,
            ProposalStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ProposalStatus>().unwrap(), status);
        }
        assert!("withdrawn".parse::<ProposalStatus>().is_err());
    }

    // ==========================================================================
    // DealScope tests
    // ==========================================================================

    #[test]
    fn scope_describe_with_all_fields() {
        let mut scope = DealScope::described("full apartment clean");
        scope.rooms = Some(3);
        assert_eq!(scope.describe(), "full apartment clean (3 rooms)");
    }

    #[test]
    fn scope_describe_defaults_when_absent() {
        let scope = DealScope::default();
        assert_eq!(scope.describe(), "the proposed work");
    }

    #[test]
    fn scope_details_default_to_empty() {
        let scope: DealScope = serde_json::from_str(r#"{"description":"x","rooms":null}"#).unwrap();
        assert!(scope.details.is_empty());
    }

    #[test]
    fn scope_from_job_scope_carries_description_and_rooms() {
        let mut job = JobScope::new("move a piano");
        job.rooms = Some(2);

        let scope = DealScope::from(&job);
        assert_eq!(scope.description.as_deref(), Some("move a piano"));
        assert_eq!(scope.rooms, Some(2));
        assert!(scope.details.is_empty());
    }

    // ==========================================================================
    // NegotiationResult tests
    // ==========================================================================

    #[test]
    fn result_new_is_pending() {
        let result = NegotiationResult::new("neg-1", "buyer-1", Some(240), None);

        assert_eq!(result.status, ProposalStatus::Pending);
        assert!(result.is_pending());
        assert!(result.responded_at.is_none());
        assert!(result.response_message.is_none());
        assert_eq!(result.final_price, Some(240));
    }

    #[test]
    fn result_serialization_roundtrip() {
        let result = NegotiationResult::new(
            "neg-1",
            "buyer-1",
            Some(500),
            Some(DealScope::described("deep clean")),
        );
        let json = serde_json::to_string(&result).unwrap();
        let parsed: NegotiationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, parsed);
    }
}
