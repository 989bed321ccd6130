//! # haggle-core
//!
//! Shared domain types for the haggle negotiation and selection engine.
//!
//! This crate provides:
//!
//! - **Negotiation records**: [`Negotiation`] and [`NegotiationMessage`] for
//!   bilateral buyer/provider threads with store-owned turn tracking
//! - **Deal proposals**: [`NegotiationResult`] and [`DealScope`] for concrete
//!   offers and their accept/reject lifecycle
//! - **Candidate inputs**: [`Candidate`], [`Preferences`], and [`JobScope`]
//!   as produced by the upstream ranking pipeline
//! - **Batch outputs**: [`NegotiationOutcome`] rows emitted by the
//!   multi-candidate orchestrator

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod candidate;
pub mod deal;
pub mod error;
pub mod negotiation;
pub mod outcome;

pub use error::CoreError;

// Re-exports for convenience
pub use candidate::{Candidate, JobScope, Preferences, Priority, ShortlistedCandidate};
pub use deal::{DealScope, NegotiationResult, ProposalStatus};
pub use negotiation::{MessageKind, Negotiation, NegotiationMessage, NegotiationStatus, Role};
pub use outcome::{NegotiationOutcome, OutcomeStatus};
