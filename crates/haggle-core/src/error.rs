//! Error types for core domain parsing.

use thiserror::Error;

/// Errors raised by core type conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A stored string did not name a known enum value.
    #[error("invalid {kind} value: {value}")]
    InvalidValue {
        /// Which enum was being parsed.
        kind: &'static str,
        /// The offending input.
        value: String,
    },
}
