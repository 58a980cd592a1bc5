//! Scripted Test Backend
//!
//! Mock infrastructure for exercising sessions and the chat controller
//! without network calls. Replies are queued up front and consumed one per
//! request; every request is recorded for later inspection.
//!
//! # Usage
//!
//! ```ignore
//! use disha_core::backend::test_utils::{Reply, ScriptedBackend};
//!
//! let backend = ScriptedBackend::new();
//! backend.push(Reply::fragments(["Hi ", "Priya", "!"]));
//! backend.push(Reply::fail("quota exceeded"));
//!
//! // After the test, verify what was sent
//! assert_eq!(backend.requests()[0].prompt, "Hello!");
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::traits::{LlmBackend, LlmRequest, LlmResponse, StreamingToken};

/// One scripted backend reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Succeed, delivering these fragments in order
    Fragments(Vec<String>),
    /// Deliver some fragments, then fail mid-stream
    FailMidStream {
        /// Fragments delivered before the failure
        fragments: Vec<String>,
        /// Error reported by the stream
        error: String,
    },
    /// Fail before any response arrives (connection refused, HTTP error)
    Fail(String),
}

impl Reply {
    /// Successful reply from string fragments
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(fragments.into_iter().map(Into::into).collect())
    }

    /// Immediate failure
    pub fn fail(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}

/// Backend that replays queued [`Reply`] values
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedBackend {
    /// Reply used once the queue is empty
    pub const DEFAULT_REPLY: &'static str = "Hello from your advisor!";

    /// Create a backend with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with a prepared script
    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let backend = Self::new();
        backend.replies.lock().extend(replies);
        backend
    }

    /// Queue a reply
    pub fn push(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    /// Every request received so far
    #[must_use]
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    fn next_reply(&self, request: &LlmRequest) -> Reply {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::fragments([Self::DEFAULT_REPLY]))
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn send_streaming(
        &self,
        request: &LlmRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let (fragments, error) = match self.next_reply(request) {
            Reply::Fail(error) => anyhow::bail!(error),
            Reply::Fragments(fragments) => (fragments, None),
            Reply::FailMidStream { fragments, error } => (fragments, Some(error)),
        };

        let (tx, rx) = mpsc::channel(fragments.len() + 1);
        tokio::spawn(async move {
            let mut message = String::new();
            for fragment in fragments {
                message.push_str(&fragment);
                if tx.send(StreamingToken::Token(fragment)).await.is_err() {
                    return;
                }
                tokio::task::yield_now().await;
            }
            let terminal = match error {
                Some(error) => StreamingToken::Error(error),
                None => StreamingToken::Complete { message },
            };
            let _ = tx.send(terminal).await;
        });
        Ok(rx)
    }

    async fn send(&self, request: &LlmRequest) -> anyhow::Result<LlmResponse> {
        match self.next_reply(request) {
            Reply::Fragments(fragments) => Ok(LlmResponse {
                content: fragments.concat(),
                model: request.model.clone(),
                tokens_used: None,
                duration_ms: None,
            }),
            Reply::Fail(error) | Reply::FailMidStream { error, .. } => anyhow::bail!(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_stream_order() {
        let backend = ScriptedBackend::with_replies([Reply::fragments(["a", "b"])]);
        let mut rx = backend
            .send_streaming(&LlmRequest::new("x", "m"))
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(StreamingToken::Token("a".into())));
        assert_eq!(rx.recv().await, Some(StreamingToken::Token("b".into())));
        assert_eq!(
            rx.recv().await,
            Some(StreamingToken::Complete {
                message: "ab".into()
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_scripted_default_and_recording() {
        let backend = ScriptedBackend::new();
        let response = backend.send(&LlmRequest::new("Hello!", "m")).await.unwrap();
        assert_eq!(response.content, ScriptedBackend::DEFAULT_REPLY);
        assert_eq!(backend.requests()[0].prompt, "Hello!");
    }
}
