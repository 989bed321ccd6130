//! # haggle-broker
//!
//! The negotiation engine: turn-taking protocol, multi-candidate
//! orchestration, and candidate selection.
//!
//! This crate provides:
//!
//! - **Protocol**: [`NegotiationProtocol`], the turn-based engine for one
//!   negotiation at a time: opening exchange, message rounds, proposals with
//!   verdicts, cancellation
//! - **Orchestration**: [`run_negotiations`], which negotiates with a whole
//!   shortlist sequentially and always reports one outcome row per candidate
//! - **Selection**: [`SelectionEngine`], shortlisting candidates before the
//!   batch and picking the winning deal after it, with a deterministic
//!   ranking path when no live model is configured
//! - **Verdicts**: [`classify_verdict`], the keyword classifier that turns
//!   a free-text reply into an accept or reject decision

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod orchestrator;
pub mod participant;
pub mod protocol;
pub mod selection;
pub mod verdict;

pub use error::{BrokerError, BrokerResult};
pub use orchestrator::{derive_proposal_price, run_negotiations, NegotiationRequest};
pub use protocol::{ExchangeRound, NegotiationProtocol, ProposalOutcome, StartedNegotiation};
pub use selection::{
    fallback_shortlist, fallback_winner, CandidateComparison, SelectionEngine, SelectionMode,
    WinnerSelection,
};
pub use verdict::{classify_verdict, Verdict};
