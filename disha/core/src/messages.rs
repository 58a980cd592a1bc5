//! Chat Messages
//!
//! Identifiers and the notifications the chat controller sends to whatever
//! surface renders the conversation (terminal, web view, test harness).
//!
//! # Design Philosophy
//!
//! Surfaces are pure renderers. They never mutate the timeline; they
//! receive a [`ChatUpdate`] for every change and either apply it to their
//! own view or re-read [`crate::timeline::MessageTimeline::snapshot`].

use serde::{Deserialize, Serialize};

/// Message identifier
///
/// Opaque and unique for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        Self(format!("msg_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The student
    User,
    /// The advisor
    Assistant,
}

/// Notifications from the chat controller to a rendering surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatUpdate {
    /// A message was appended to the timeline
    Appended {
        /// New message ID
        id: MessageId,
        /// Who sent it
        sender: Sender,
        /// Initial text (empty for a placeholder)
        text: String,
        /// Whether the message is still being generated
        generating: bool,
    },

    /// A streamed fragment was appended to a generating message
    Delta {
        /// Message being streamed
        id: MessageId,
        /// The fragment text
        fragment: String,
    },

    /// A message stopped generating
    Finalized {
        /// Message that completed
        id: MessageId,
        /// Final text, frozen from here on
        text: String,
    },

    /// An exchange started or finished; surfaces should disable input while busy
    Busy {
        /// Whether an exchange is in flight
        busy: bool,
    },
}
