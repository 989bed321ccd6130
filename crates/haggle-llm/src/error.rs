//! Chat backend error types.

use thiserror::Error;

/// Errors returned by chat-completion backends.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api error (status {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for the operator's eyes.
        body: String,
    },

    /// The model's reply could not be parsed into the expected shape.
    /// Keeps the raw text so callers can log or surface it.
    #[error("malformed model response: {detail}")]
    MalformedResponse {
        /// What was wrong.
        detail: String,
        /// The unparsed reply.
        raw: String,
    },

    /// A live backend was selected without the credentials it needs.
    #[error("chat backend not configured: {0}")]
    Unconfigured(String),
}

impl ChatError {
    /// Builds a malformed-response error, keeping the raw reply.
    #[must_use]
    pub fn malformed(detail: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
            raw: raw.into(),
        }
    }
}
