//! Chat backend configuration.
//!
//! Resolved once at the orchestration entry point. Engine code receives a
//! built model and never reads the environment itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Which chat backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Deterministic offline backend.
    #[default]
    Stub,
}

impl ChatBackend {
    /// Returns the backend as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Stub => "stub",
        }
    }

    /// Returns true for backends that talk to a remote API.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !matches!(self, Self::Stub)
    }

    /// Returns the default model identifier for this backend.
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Stub => "stub",
        }
    }
}

impl fmt::Display for ChatBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChatBackend {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "stub" => Ok(Self::Stub),
            other => Err(ChatError::Unconfigured(format!(
                "unknown chat backend: {other}"
            ))),
        }
    }
}

/// Settings for constructing a chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Backend to construct.
    pub backend: ChatBackend,
    /// Model identifier sent to the API.
    pub model: String,
    /// API credential, required for live backends.
    pub api_key: Option<String>,
    /// Endpoint override for OpenAI-compatible gateways.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion length cap.
    pub max_tokens: u32,
}

impl ChatConfig {
    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    /// Default completion length cap.
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;

    /// Builds a config for the given backend with default knobs.
    #[must_use]
    pub fn for_backend(backend: ChatBackend) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            api_key: None,
            base_url: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    /// Builds a stub config for tests and offline runs.
    #[must_use]
    pub fn stub() -> Self {
        Self::for_backend(ChatBackend::Stub)
    }

    /// Resolves a config from the environment, once, at startup.
    ///
    /// Reads `OPENAI_API_KEY` or `ANTHROPIC_API_KEY` depending on the
    /// backend, plus the optional `HAGGLE_LLM_MODEL` and
    /// `HAGGLE_LLM_BASE_URL` overrides.
    #[must_use]
    pub fn from_env(backend: ChatBackend) -> Self {
        let mut config = Self::for_backend(backend);
        config.api_key = match backend {
            ChatBackend::OpenAi => std::env::var("OPENAI_API_KEY").ok(),
            ChatBackend::Anthropic => std::env::var("ANTHROPIC_API_KEY").ok(),
            ChatBackend::Stub => None,
        };
        if let Ok(model) = std::env::var("HAGGLE_LLM_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("HAGGLE_LLM_BASE_URL") {
            if !base_url.is_empty() {
                config.base_url = Some(base_url);
            }
        }
        config
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API credential.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::stub()
    }
}
