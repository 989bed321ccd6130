//! Store error types.

use thiserror::Error;

/// Errors returned by negotiation store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Which record type was looked up.
        entity: &'static str,
        /// The id that missed.
        id: String,
    },

    /// The backing database failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Builds a not-found error for a negotiation id.
    #[must_use]
    pub fn negotiation_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "negotiation",
            id: id.into(),
        }
    }

    /// Builds a not-found error for a result id.
    #[must_use]
    pub fn result_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "negotiation result",
            id: id.into(),
        }
    }

    /// Returns true for missing-record errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<haggle_core::CoreError> for StoreError {
    fn from(err: haggle_core::CoreError) -> Self {
        Self::Backend(err.to_string())
    }
}
