//! Error types for the negotiation engine.

use haggle_core::Negotiation;
use haggle_llm::ChatError;
use haggle_store::StoreError;
use thiserror::Error;

/// Result type alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur while brokering negotiations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A referenced negotiation or result does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Which record type was looked up.
        entity: &'static str,
        /// The id that missed.
        id: String,
    },

    /// The operation requires an active negotiation.
    #[error("negotiation {negotiation_id} is {status}, expected active")]
    InvalidState {
        /// The thread that was in the wrong state.
        negotiation_id: String,
        /// The state it was actually in.
        status: haggle_core::NegotiationStatus,
    },

    /// The caller supplied input a selection task cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A live reasoning reply referenced unknown data or failed validation.
    /// Keeps the raw reply for diagnostics.
    #[error("invalid model response: {detail}")]
    InvalidResponse {
        /// What was wrong.
        detail: String,
        /// The unvalidated reply text.
        raw: String,
    },

    /// The chat-completion backend failed.
    #[error("chat backend error: {0}")]
    Provider(#[from] ChatError),

    /// The negotiation store failed below the contract level.
    #[error("store error: {0}")]
    Store(String),
}

impl BrokerError {
    /// Builds a not-found error for a negotiation id.
    #[must_use]
    pub fn negotiation_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "negotiation",
            id: id.into(),
        }
    }

    /// Builds an invalid-state error from the offending thread.
    #[must_use]
    pub fn invalid_state(negotiation: &Negotiation) -> Self {
        Self::InvalidState {
            negotiation_id: negotiation.id.clone(),
            status: negotiation.status,
        }
    }

    /// Builds an invalid-response error, keeping the raw reply.
    #[must_use]
    pub fn invalid_response(detail: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::InvalidResponse {
            detail: detail.into(),
            raw: raw.into(),
        }
    }
}

impl From<StoreError> for BrokerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Backend(detail) => Self::Store(detail),
        }
    }
}
