//! Structured output extraction from loosely formatted model text.
//!
//! Models wrap JSON in markdown fences, preambles, and trailing commentary.
//! The extractor takes the greedy span from the first `{` to the last `}`
//! after dropping fence lines, then hands the span to serde. Replies with
//! multiple top-level objects are out of contract and fail the decode.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::ChatError;

static JSON_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap_or_else(|_| unreachable!()));

/// Returns the greedy `{`..`}` span of the text, when one exists.
#[must_use]
pub fn extract_json_span(text: &str) -> Option<&str> {
    JSON_SPAN_RE.find(text).map(|m| m.as_str())
}

fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes a typed JSON payload out of a model reply.
///
/// # Errors
///
/// Returns [`ChatError::MalformedResponse`] carrying the raw reply when no
/// JSON object is present or the object does not match `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, ChatError> {
    let cleaned = strip_code_fences(raw);
    let span = extract_json_span(&cleaned)
        .ok_or_else(|| ChatError::malformed("no json object in reply", raw))?;
    serde_json::from_str(span).map_err(|err| ChatError::malformed(err.to_string(), raw))
}
