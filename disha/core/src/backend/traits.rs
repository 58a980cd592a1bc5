//! Advisory Backend Traits
//!
//! Trait definitions for generative-text backends. The session layer only
//! depends on three capabilities: a system instruction carried with every
//! request, a buffered send, and a streaming send.
//!
//! # Design Philosophy
//!
//! Backends are stateless. The conversation history travels inside each
//! [`LlmRequest`]; the [`crate::session::AdvisorySession`] owns it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Token stream events from backends
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamingToken {
    /// A text fragment of the response
    Token(String),
    /// Response completed successfully
    Complete {
        /// Concatenation of every fragment sent
        message: String,
    },
    /// Error occurred during streaming
    Error(String),
}

/// Who authored a turn in the conversation history
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The student
    User,
    /// The advisor model
    Model,
}

/// One completed turn of conversation history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the turn
    pub role: TurnRole,
    /// Turn text
    pub text: String,
}

impl Turn {
    /// User turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// Model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// A single request to the backend
#[derive(Clone, Debug)]
pub struct LlmRequest {
    /// The new user message
    pub prompt: String,
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// System instruction
    pub system: Option<String>,
    /// Earlier turns, oldest first
    pub history: Vec<Turn>,
    /// Temperature (0.0-2.0), `None` = backend default
    pub temperature: Option<f32>,
    /// Maximum output tokens (0 = default)
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Create a new request with prompt and model
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            history: Vec::new(),
            temperature: None,
            max_tokens: 0,
        }
    }

    /// Set system instruction
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set prior conversation turns
    #[must_use]
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from a buffered request
#[derive(Clone, Debug)]
pub struct LlmResponse {
    /// The response text
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Output tokens used (if reported)
    pub tokens_used: Option<u32>,
    /// Response generation time in milliseconds
    pub duration_ms: Option<u64>,
}

/// Advisory backend trait
///
/// Implement this trait to add support for a different provider.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name (e.g. "Gemini")
    fn name(&self) -> &str;

    /// Send a request and get a streaming response
    ///
    /// Returns a channel receiver that yields fragments in arrival order,
    /// terminated by `Complete` or `Error`. The channel closes afterwards.
    async fn send_streaming(
        &self,
        request: &LlmRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>>;

    /// Send a request and wait for the complete response
    async fn send(&self, request: &LlmRequest) -> anyhow::Result<LlmResponse>;
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
    /// API credential; `None` makes session creation fail
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// API base URL (without trailing slash)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    /// Default model
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";
    /// Default API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    /// Default request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Configuration with an explicit credential
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}
