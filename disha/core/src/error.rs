//! Error Types
//!
//! Failure taxonomy for the advisor core. Backend failures are typed at the
//! session boundary; everything above it (chat controller, timeline) either
//! recovers locally or treats the error as a programming defect.

use std::path::PathBuf;

use thiserror::Error;

use crate::messages::MessageId;
use crate::profile::ProfileField;

/// Errors from the advisory backend and session layer
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    /// The backend cannot be initialized (e.g. missing credential).
    ///
    /// Fatal to the chat feature only; careers and games keep working.
    #[error("Advisor not configured: {0}")]
    Configuration(String),

    /// A buffered or streaming exchange failed (network, timeout, quota,
    /// malformed response)
    #[error("Advisor request failed: {0}")]
    Upstream(String),
}

impl AdvisorError {
    /// Wrap any transport failure as an upstream error
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::Upstream(err.to_string())
    }

    /// Whether this error disables the chat feature for the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Misuse of the message timeline
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimelineError {
    /// The message does not exist or has already been finalized
    #[error("Unknown or finalized message: {0}")]
    UnknownMessage(MessageId),
}

/// Errors from the key-value persistence surface
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the backing file
    #[error("Failed to read store at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to write the backing file
    #[error("Failed to write store at {path}: {source}")]
    Write {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings
    #[error("Store at {path} is corrupt: {source}")]
    Corrupt {
        /// The path that was read
        path: PathBuf,
        /// The parse failure
        source: serde_json::Error,
    },
}

/// Misuse of the onboarding state machine
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OnboardingError {
    /// `finish` called before the last step was accepted
    #[error("Onboarding is not finishing")]
    NotFinishing,

    /// A step has no answer
    #[error("Onboarding answer missing for {0}")]
    Incomplete(ProfileField),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(AdvisorError::Configuration("no key".into()).is_fatal());
        assert!(!AdvisorError::Upstream("timeout".into()).is_fatal());
    }

    #[test]
    fn test_upstream_display() {
        let err = AdvisorError::upstream("429 Too Many Requests");
        assert_eq!(
            err.to_string(),
            "Advisor request failed: 429 Too Many Requests"
        );
    }
}
