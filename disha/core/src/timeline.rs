//! Message Timeline
//!
//! Ordered, append-only log of the chat messages shown to the student.
//!
//! # Design Philosophy
//!
//! The timeline is the only chat state a surface ever renders. Messages are
//! never removed or reordered; the single mutable entry is the assistant
//! placeholder currently being generated, which grows fragment by fragment
//! and freezes once finalized.

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::messages::{MessageId, Sender};

/// A message in the chat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub sender: Sender,
    /// Message text
    pub text: String,
    /// Whether the message is still being generated
    pub generating: bool,
    /// When the message was appended (Unix timestamp ms)
    pub created_at: i64,
}

impl ChatMessage {
    fn new(sender: Sender, text: String, generating: bool) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            text,
            generating,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Append-only chat log
#[derive(Clone, Debug, Default)]
pub struct MessageTimeline {
    messages: Vec<ChatMessage>,
}

impl MessageTimeline {
    /// Create an empty timeline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized user message
    pub fn append_user(&mut self, text: impl Into<String>) -> MessageId {
        let msg = ChatMessage::new(Sender::User, text.into(), false);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Append an empty assistant message that is still generating
    ///
    /// Callers must finalize the previous placeholder first.
    pub fn append_placeholder_assistant(&mut self) -> MessageId {
        debug_assert!(
            self.generating_id().is_none(),
            "placeholder opened while another is generating"
        );
        let msg = ChatMessage::new(Sender::Assistant, String::new(), true);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Append a fragment to a generating message
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::UnknownMessage`] if `id` does not exist or
    /// has already been finalized. The timeline is left unchanged.
    pub fn apply_delta(&mut self, id: &MessageId, fragment: &str) -> Result<(), TimelineError> {
        let msg = self.generating_mut(id)?;
        msg.text.push_str(fragment);
        Ok(())
    }

    /// Stop generation of a message
    ///
    /// Finalizing an already-final message is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::UnknownMessage`] if `id` does not exist.
    pub fn finalize(&mut self, id: &MessageId) -> Result<&ChatMessage, TimelineError> {
        let msg = self
            .messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| TimelineError::UnknownMessage(id.clone()))?;
        msg.generating = false;
        Ok(msg)
    }

    /// Replace a generating message's text and finalize it in one step
    ///
    /// Used when an exchange fails and the partial text gives way to a
    /// fixed apology.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::UnknownMessage`] if `id` does not exist or
    /// has already been finalized.
    pub fn finalize_with(
        &mut self,
        id: &MessageId,
        text: impl Into<String>,
    ) -> Result<&ChatMessage, TimelineError> {
        let msg = self.generating_mut(id)?;
        msg.text = text.into();
        msg.generating = false;
        Ok(msg)
    }

    /// Ordered copy of every message, in append order
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Borrow a message by ID
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// ID of the message currently generating, if any
    #[must_use]
    pub fn generating_id(&self) -> Option<&MessageId> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.generating)
            .map(|m| &m.id)
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been appended yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn generating_mut(&mut self, id: &MessageId) -> Result<&mut ChatMessage, TimelineError> {
        self.messages
            .iter_mut()
            .find(|m| &m.id == id && m.generating)
            .ok_or_else(|| TimelineError::UnknownMessage(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_user() {
        let mut timeline = MessageTimeline::new();
        let id = timeline.append_user("Hello");

        let msg = timeline.get(&id).unwrap();
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.text, "Hello");
        assert!(!msg.generating);
        assert!(timeline.generating_id().is_none());
    }

    #[test]
    fn test_streaming_placeholder() {
        let mut timeline = MessageTimeline::new();
        let id = timeline.append_placeholder_assistant();
        assert_eq!(timeline.generating_id(), Some(&id));

        timeline.apply_delta(&id, "Hi ").unwrap();
        timeline.apply_delta(&id, "Priya").unwrap();
        let msg = timeline.get(&id).unwrap();
        assert!(msg.generating);
        assert_eq!(msg.text, "Hi Priya");

        let msg = timeline.finalize(&id).unwrap();
        assert!(!msg.generating);
        assert_eq!(msg.text, "Hi Priya");
        assert!(timeline.generating_id().is_none());
    }

    #[test]
    fn test_delta_after_finalize_is_rejected() {
        let mut timeline = MessageTimeline::new();
        let id = timeline.append_placeholder_assistant();
        timeline.apply_delta(&id, "done").unwrap();
        timeline.finalize(&id).unwrap();

        assert_eq!(
            timeline.apply_delta(&id, " more"),
            Err(TimelineError::UnknownMessage(id.clone()))
        );
        assert_eq!(timeline.get(&id).unwrap().text, "done");
    }

    #[test]
    fn test_delta_to_unknown_or_user_message() {
        let mut timeline = MessageTimeline::new();
        let user = timeline.append_user("Hi");

        assert!(timeline.apply_delta(&MessageId::new(), "x").is_err());
        assert!(timeline.apply_delta(&user, "x").is_err());
        assert!(timeline.finalize(&MessageId::new()).is_err());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut timeline = MessageTimeline::new();
        let id = timeline.append_placeholder_assistant();
        timeline.apply_delta(&id, "ok").unwrap();

        let first = timeline.finalize(&id).unwrap().clone();
        let second = timeline.finalize(&id).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_finalize_with_replaces_partial_text() {
        let mut timeline = MessageTimeline::new();
        let id = timeline.append_placeholder_assistant();
        timeline.apply_delta(&id, "Half an ans").unwrap();

        let msg = timeline.finalize_with(&id, "Sorry").unwrap();
        assert_eq!(msg.text, "Sorry");
        assert!(!msg.generating);
        assert!(timeline.finalize_with(&id, "again").is_err());
    }

    #[test]
    fn test_snapshot_preserves_append_order() {
        let mut timeline = MessageTimeline::new();
        let greeting = timeline.append_placeholder_assistant();
        timeline.finalize_with(&greeting, "Welcome").unwrap();
        let question = timeline.append_user("What now?");
        let answer = timeline.append_placeholder_assistant();

        let ids: Vec<_> = timeline.snapshot().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![greeting, question, answer]);
        assert_eq!(timeline.len(), 3);
    }
}
