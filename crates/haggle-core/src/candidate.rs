//! Candidate providers and buyer preferences, as handed over by the upstream
//! ranking pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the buyer cares about most when comparing deals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Lowest price wins.
    Cost,
    /// Fastest schedule wins.
    Speed,
    /// Best workmanship wins.
    #[default]
    Quality,
}

impl Priority {
    /// Returns the priority as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Speed => "speed",
            Self::Quality => "quality",
        }
    }

    /// Returns the negotiation stance this priority implies.
    #[must_use]
    pub const fn stance(&self) -> &'static str {
        match self {
            Self::Cost => "keep the price efficient",
            Self::Speed => "keep the schedule fast",
            Self::Quality => "protect the quality of the work",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Buyer-side constraints for a negotiation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Dominant comparison axis.
    pub priority: Priority,
    /// Spending ceiling, when the buyer set one.
    pub budget: Option<i64>,
    /// Conditions that disqualify a deal outright.
    #[serde(default)]
    pub deal_breakers: Vec<String>,
}

impl Preferences {
    /// Creates preferences with just a priority.
    #[must_use]
    pub fn with_priority(priority: Priority) -> Self {
        Self {
            priority,
            budget: None,
            deal_breakers: Vec::new(),
        }
    }
}

/// One provider candidate scored by the upstream ranking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque candidate identifier, also used as the provider agent id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ranking score in 0.0..=1.0, higher is better.
    pub score: f64,
    /// Fixed asking price, when advertised.
    pub base_price: Option<i64>,
    /// Hourly rate, when advertised.
    pub hourly_rate: Option<i64>,
    /// Short pitch line used when introducing the candidate.
    pub headline: Option<String>,
}

impl Candidate {
    /// Creates a candidate with no advertised pricing.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score,
            base_price: None,
            hourly_rate: None,
            headline: None,
        }
    }
}

/// What the buyer wants done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobScope {
    /// Free-text description of the job.
    pub description: String,
    /// Room count, when the job is spatial.
    pub rooms: Option<u32>,
}

impl JobScope {
    /// Creates a scope from a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            rooms: None,
        }
    }
}

/// A candidate that survived shortlisting, with the selection rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistedCandidate {
    /// The underlying candidate.
    pub candidate: Candidate,
    /// Why this candidate made the cut.
    pub reasoning: String,
    /// Fit score in 0..=100.
    pub match_score: u32,
}
