//! Advisory Backend Integration
//!
//! Abstracted access to generative-text services through a common trait.
//!
//! # Available Backends
//!
//! - **Gemini**: Google Generative Language API (default)
//! - **Scripted**: queued replies for tests ([`test_utils`])
//!
//! # Usage
//!
//! ```ignore
//! use disha_core::backend::{BackendConfig, GeminiBackend, LlmBackend, LlmRequest};
//!
//! let backend = GeminiBackend::from_config(&BackendConfig::default().with_api_key(key))?;
//! let request = LlmRequest::new("Hello!", "gemini-2.5-flash");
//! let rx = backend.send_streaming(&request).await?;
//! ```

mod gemini;
pub mod test_utils;
mod traits;

pub use gemini::GeminiBackend;
pub use traits::{
    BackendConfig, LlmBackend, LlmRequest, LlmResponse, StreamingToken, Turn, TurnRole,
};
