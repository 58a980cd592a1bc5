//! Chat Controller
//!
//! Drives exchanges between the [`MessageTimeline`] and the
//! [`AdvisorySession`], mirroring every timeline change to the rendering
//! surface as a [`ChatUpdate`].
//!
//! # Exchange shape
//!
//! ```text
//! Busy(true) -> Appended(user) -> Appended(placeholder)
//!            -> Delta* -> Finalized -> Busy(false)
//! ```
//!
//! The greeting skips the user message. Upstream failures never escape:
//! the placeholder is finalized with a fixed apology instead.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::messages::{ChatUpdate, MessageId, Sender};
use crate::relay::PromptRelay;
use crate::session::AdvisorySession;
use crate::timeline::MessageTimeline;

/// Message sent to the advisor to produce the opening greeting
pub const GREETING_PROMPT: &str = "Hello!";

/// Greeting shown when the advisor cannot be reached
pub const GREETING_FALLBACK: &str =
    "Hello! I'm having a little trouble connecting right now, but I'm here to help.";

/// Reply shown when a streamed exchange fails
pub const STREAM_FALLBACK: &str = "Sorry, something went wrong. Please try again.";

/// Owns the chat timeline and runs one exchange at a time
///
/// Exchanges take `&mut self`, so two cannot overlap on one controller.
pub struct ChatController {
    session: Arc<AdvisorySession>,
    timeline: MessageTimeline,
    tx: mpsc::Sender<ChatUpdate>,
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("session", &self.session.id())
            .field("messages", &self.timeline.len())
            .finish_non_exhaustive()
    }
}

impl ChatController {
    /// Create a controller with an empty timeline
    pub fn new(session: Arc<AdvisorySession>, tx: mpsc::Sender<ChatUpdate>) -> Self {
        Self {
            session,
            timeline: MessageTimeline::new(),
            tx,
        }
    }

    /// The timeline as rendered so far
    #[must_use]
    pub fn timeline(&self) -> &MessageTimeline {
        &self.timeline
    }

    /// The session this controller talks to
    #[must_use]
    pub fn session(&self) -> &Arc<AdvisorySession> {
        &self.session
    }

    /// Run the greeting exchange
    ///
    /// Only runs on an empty timeline; returns `None` otherwise. The
    /// returned text is the advisor's reply or [`GREETING_FALLBACK`].
    pub async fn greet(&mut self) -> Option<String> {
        if !self.timeline.is_empty() {
            return None;
        }

        self.emit(ChatUpdate::Busy { busy: true }).await;
        let id = self.open_placeholder().await;

        let text = match self.session.send_buffered(GREETING_PROMPT).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Greeting failed, using fallback");
                GREETING_FALLBACK.to_string()
            }
        };

        self.close_with(&id, text.clone()).await;
        self.emit(ChatUpdate::Busy { busy: false }).await;
        Some(text)
    }

    /// Send a user message and stream the reply
    ///
    /// Blank input is ignored and returns `None`. Otherwise returns the ID
    /// of the assistant message, which is final when this returns.
    pub async fn send(&mut self, text: &str) -> Option<MessageId> {
        if text.trim().is_empty() {
            return None;
        }

        self.emit(ChatUpdate::Busy { busy: true }).await;

        let user_id = self.timeline.append_user(text);
        self.emit(ChatUpdate::Appended {
            id: user_id,
            sender: Sender::User,
            text: text.to_string(),
            generating: false,
        })
        .await;

        let id = self.open_placeholder().await;
        tracing::debug!(message_id = %id, "Streaming reply");

        let mut stream = match self.session.send_streaming(text).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(message_id = %id, error = %e, "Could not open reply stream");
                self.close_with(&id, STREAM_FALLBACK).await;
                self.emit(ChatUpdate::Busy { busy: false }).await;
                return Some(id);
            }
        };

        let mut failed = false;
        while let Some(fragment) = stream.next_fragment().await {
            match fragment {
                Ok(fragment) => {
                    if let Err(e) = self.timeline.apply_delta(&id, &fragment) {
                        tracing::error!(error = %e, "Delta rejected by timeline");
                        continue;
                    }
                    self.emit(ChatUpdate::Delta {
                        id: id.clone(),
                        fragment,
                    })
                    .await;
                }
                Err(e) => {
                    tracing::warn!(message_id = %id, error = %e, "Reply stream failed");
                    failed = true;
                }
            }
        }

        if failed {
            self.close_with(&id, STREAM_FALLBACK).await;
        } else {
            match self.timeline.finalize(&id).map(|msg| msg.text.clone()) {
                Ok(text) => {
                    self.emit(ChatUpdate::Finalized {
                        id: id.clone(),
                        text,
                    })
                    .await;
                }
                Err(e) => tracing::error!(error = %e, "Finalize rejected by timeline"),
            }
        }

        self.emit(ChatUpdate::Busy { busy: false }).await;
        Some(id)
    }

    /// Send the relay's pending prompt, if any
    ///
    /// Consumes the relay exactly once.
    pub async fn take_pending(&mut self, relay: &PromptRelay) -> Option<MessageId> {
        let prompt = relay.consume()?;
        tracing::debug!("Sending relayed prompt");
        self.send(&prompt).await
    }

    async fn open_placeholder(&mut self) -> MessageId {
        let id = self.timeline.append_placeholder_assistant();
        self.emit(ChatUpdate::Appended {
            id: id.clone(),
            sender: Sender::Assistant,
            text: String::new(),
            generating: true,
        })
        .await;
        id
    }

    async fn close_with(&mut self, id: &MessageId, text: impl Into<String>) {
        let text = match self.timeline.finalize_with(id, text).map(|msg| msg.text.clone()) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Finalize rejected by timeline");
                return;
            }
        };
        self.emit(ChatUpdate::Finalized {
            id: id.clone(),
            text,
        })
        .await;
    }

    async fn emit(&self, update: ChatUpdate) {
        if let Err(e) = self.tx.send(update).await {
            tracing::warn!("Failed to send update to surface: {}", e);
        }
    }
}
