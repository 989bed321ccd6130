//! Accept/reject classification of free-text proposal replies.
//!
//! Classification is a narrow substring match with documented precedence:
//! rejection and counter-offer tokens veto an acceptance token. A reply that
//! carries both "accept" and "reject" wording in unrelated clauses therefore
//! classifies as rejected; that ambiguity is inherent to free text and pinned
//! by tests rather than special-cased.

use haggle_core::ProposalStatus;
use serde::{Deserialize, Serialize};

/// Tokens that signal the responder takes the deal.
const ACCEPT_TOKENS: [&str; 4] = ["accept", "agree", "deal", "sounds good"];

/// Tokens that signal refusal. Any match vetoes acceptance.
const REJECT_TOKENS: [&str; 5] = [
    "reject",
    "decline",
    "cannot accept",
    "can't accept",
    "no deal",
];

/// Tokens that signal a counter-offer rather than a verdict. Treated as a
/// veto: a countered proposal is not an accepted one.
const COUNTER_TOKENS: [&str; 3] = ["counter", "instead", "how about"];

/// The verdict read out of a responder's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The responder took the deal.
    Accepted,
    /// The responder refused, countered, or gave no clear acceptance.
    Rejected,
}

impl Verdict {
    /// Returns true when the deal was taken.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Maps the verdict onto the proposal lifecycle.
    #[must_use]
    pub const fn proposal_status(&self) -> ProposalStatus {
        match self {
            Self::Accepted => ProposalStatus::Accepted,
            Self::Rejected => ProposalStatus::Rejected,
        }
    }
}

/// Classifies a free-text reply to a proposal.
///
/// Accepted iff an acceptance token is present and no rejection or
/// counter-offer token is. Matching is case-insensitive on substrings.
#[must_use]
pub fn classify_verdict(reply: &str) -> Verdict {
    let lowered = reply.to_lowercase();
    let accepts = ACCEPT_TOKENS.iter().any(|token| lowered.contains(token));
    let vetoed = REJECT_TOKENS
        .iter()
        .chain(COUNTER_TOKENS.iter())
        .any(|token| lowered.contains(token));

    if accepts && !vetoed {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    }
}
