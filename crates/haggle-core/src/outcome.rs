//! Per-candidate outcome rows emitted by the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deal::NegotiationResult;

/// How one candidate's negotiation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// A proposal was accepted.
    Completed,
    /// The proposal was turned down.
    Rejected,
    /// The candidate's run failed before a verdict.
    Failed,
}

impl OutcomeStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of orchestrator output. Batches always yield exactly one row per
/// input candidate, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    /// Thread id, empty when the candidate failed before a thread existed.
    pub negotiation_id: String,
    /// Candidate this row belongs to.
    pub candidate_id: String,
    /// Candidate display name, carried for presentation.
    pub candidate_name: String,
    /// How the run ended.
    pub status: OutcomeStatus,
    /// The settled proposal, when one was reached.
    pub result: Option<NegotiationResult>,
    /// Human-readable account of the run.
    pub summary: Option<String>,
}

impl NegotiationOutcome {
    /// Builds a failure row for a candidate whose run broke down.
    #[must_use]
    pub fn failed(
        negotiation_id: impl Into<String>,
        candidate_id: impl Into<String>,
        candidate_name: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            negotiation_id: negotiation_id.into(),
            candidate_id: candidate_id.into(),
            candidate_name: candidate_name.into(),
            status: OutcomeStatus::Failed,
            result: None,
            summary: Some(summary.into()),
        }
    }

    /// Returns true when this row carries an accepted deal.
    #[must_use]
    pub fn is_accepted_deal(&self) -> bool {
        self.status == OutcomeStatus::Completed
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.status == crate::deal::ProposalStatus::Accepted)
    }

    /// Returns the settled price, when one exists.
    #[must_use]
    pub fn settled_price(&self) -> Option<i64> {
        self.result.as_ref().and_then(|r| r.final_price)
    }
}
