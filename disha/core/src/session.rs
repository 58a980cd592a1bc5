//! Advisory Sessions
//!
//! One logical conversation with the advisory backend per run.
//!
//! # Design Philosophy
//!
//! The [`SessionProvider`] is constructed once at startup and passed by
//! reference to whoever needs it. Its first successful [`SessionProvider::create`]
//! fixes the system instruction for the rest of the run; later calls return
//! the same [`AdvisorySession`] regardless of the profile they carry.
//!
//! The session keeps the backend-side turn history (what the model has
//! seen). Surfaces keep nothing beyond the rendered
//! [`crate::timeline::MessageTimeline`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::backend::{BackendConfig, GeminiBackend, LlmBackend, LlmRequest, StreamingToken, Turn};
use crate::error::AdvisorError;
use crate::profile::UserProfile;

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    #[must_use]
    pub fn new() -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self(format!(
            "session_{timestamp}_{}",
            uuid::Uuid::new_v4().simple()
        ))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the advisor's system instruction from a profile
///
/// The four profile fields are embedded verbatim.
#[must_use]
pub fn system_instruction(profile: &UserProfile) -> String {
    format!(
        "You are Disha, a friendly, modern, and encouraging AI career advisor for students in India.
Your primary goal is to provide personalized, insightful, and actionable career guidance based on the user's profile.
Always be positive and empowering. Keep your responses concise and easy to read, using formatting like lists and bold text where helpful.
You are aware of the Indian job market and educational landscape.

User Profile:
- Name: {name}
- Interests: {interests}
- Skills: {skills}
- Personality: {personality}

Based on this profile, tailor every response to be as relevant as possible to {name}. Do not just repeat the profile information; use it to make inferences and connections. Start your first message with a warm welcome to the user by their name.",
        name = profile.name,
        interests = profile.interests,
        skills = profile.skills,
        personality = profile.personality,
    )
}

/// A single conversation bound to one system instruction
pub struct AdvisorySession {
    id: SessionId,
    backend: Arc<dyn LlmBackend>,
    model: String,
    system_instruction: String,
    history: Arc<Mutex<Vec<Turn>>>,
}

impl std::fmt::Debug for AdvisorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorySession")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("turns", &self.history.lock().len())
            .finish_non_exhaustive()
    }
}

impl AdvisorySession {
    fn new(backend: Arc<dyn LlmBackend>, model: String, system_instruction: String) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            model,
            system_instruction,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Session ID
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Model in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// System instruction fixed at creation
    #[must_use]
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Completed turns the backend has seen, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.history.lock().clone()
    }

    fn request(&self, text: &str) -> LlmRequest {
        LlmRequest::new(text, &self.model)
            .with_system(self.system_instruction.clone())
            .with_history(self.history())
    }

    /// Send a message and wait for the full reply
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Upstream`] on any transport failure or an
    /// empty reply. Callers substitute a user-visible fallback.
    pub async fn send_buffered(&self, text: &str) -> Result<String, AdvisorError> {
        tracing::debug!(session = %self.id.0, "Buffered exchange started");

        let response = self
            .backend
            .send(&self.request(text))
            .await
            .map_err(|e| AdvisorError::Upstream(format!("{e:#}")))?;

        if response.content.is_empty() {
            return Err(AdvisorError::Upstream("empty response".to_string()));
        }

        let mut history = self.history.lock();
        history.push(Turn::user(text));
        history.push(Turn::model(response.content.clone()));
        drop(history);

        tracing::debug!(
            session = %self.id.0,
            tokens = ?response.tokens_used,
            duration_ms = ?response.duration_ms,
            "Buffered exchange complete"
        );
        Ok(response.content)
    }

    /// Send a message and receive the reply as ordered fragments
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Upstream`] when the stream cannot be opened.
    /// Failures after that arrive through [`ResponseStream::next_fragment`].
    pub async fn send_streaming(&self, text: &str) -> Result<ResponseStream, AdvisorError> {
        tracing::debug!(session = %self.id.0, "Streaming exchange started");

        let rx = self
            .backend
            .send_streaming(&self.request(text))
            .await
            .map_err(|e| AdvisorError::Upstream(format!("{e:#}")))?;

        Ok(ResponseStream {
            inner: ReceiverStream::new(rx),
            prompt: text.to_string(),
            received: String::new(),
            history: Arc::clone(&self.history),
            finished: false,
        })
    }
}

/// Finite, non-restartable sequence of response fragments
///
/// Fragments come out in arrival order. The exchange is recorded in the
/// session history only if the stream completes successfully.
#[derive(Debug)]
pub struct ResponseStream {
    inner: ReceiverStream<StreamingToken>,
    prompt: String,
    received: String,
    history: Arc<Mutex<Vec<Turn>>>,
    finished: bool,
}

impl ResponseStream {
    /// Next fragment
    ///
    /// Returns `None` once the stream has completed. An `Err` is terminal:
    /// every call after it returns `None`.
    pub async fn next_fragment(&mut self) -> Option<Result<String, AdvisorError>> {
        if self.finished {
            return None;
        }

        loop {
            match self.inner.next().await {
                Some(StreamingToken::Token(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    self.received.push_str(&text);
                    return Some(Ok(text));
                }
                Some(StreamingToken::Complete { .. }) => {
                    self.finished = true;
                    self.record();
                    return None;
                }
                Some(StreamingToken::Error(error)) => {
                    self.finished = true;
                    tracing::warn!(error = %error, "Response stream failed");
                    return Some(Err(AdvisorError::Upstream(error)));
                }
                None => {
                    self.finished = true;
                    return Some(Err(AdvisorError::Upstream(
                        "stream closed before completion".to_string(),
                    )));
                }
            }
        }
    }

    /// Text received so far
    #[must_use]
    pub fn received(&self) -> &str {
        &self.received
    }

    /// Drain the stream into one string
    ///
    /// # Errors
    ///
    /// Returns the first upstream failure.
    pub async fn collect_text(mut self) -> Result<String, AdvisorError> {
        while let Some(fragment) = self.next_fragment().await {
            fragment?;
        }
        Ok(self.received)
    }

    fn record(&self) {
        let mut history = self.history.lock();
        history.push(Turn::user(self.prompt.clone()));
        history.push(Turn::model(self.received.clone()));
        tracing::debug!(bytes = self.received.len(), "Streaming exchange complete");
    }
}

type Connector = Box<dyn Fn() -> Result<Arc<dyn LlmBackend>, AdvisorError> + Send + Sync>;

/// Creates and holds the run's single [`AdvisorySession`]
pub struct SessionProvider {
    connect: Connector,
    model: String,
    session: Mutex<Option<Arc<AdvisorySession>>>,
}

impl std::fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("model", &self.model)
            .field("session", &self.session.lock().as_ref().map(|s| s.id.clone()))
            .finish_non_exhaustive()
    }
}

impl SessionProvider {
    /// Provider backed by Gemini
    ///
    /// The backend is only constructed on the first [`Self::create`], so a
    /// missing credential surfaces there as [`AdvisorError::Configuration`].
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        let model = config.model.clone();
        Self {
            connect: Box::new(move || {
                GeminiBackend::from_config(&config).map(|b| Arc::new(b) as Arc<dyn LlmBackend>)
            }),
            model,
            session: Mutex::new(None),
        }
    }

    /// Provider backed by an already-constructed backend
    pub fn with_backend(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            connect: Box::new(move || Ok(Arc::clone(&backend))),
            model: model.into(),
            session: Mutex::new(None),
        }
    }

    /// Create the session, or return the one already created
    ///
    /// First writer wins: once a session exists, `profile` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Configuration`] if the backend cannot be
    /// constructed. No session is stored in that case.
    pub fn create(&self, profile: &UserProfile) -> Result<Arc<AdvisorySession>, AdvisorError> {
        let mut slot = self.session.lock();
        if let Some(session) = slot.as_ref() {
            tracing::debug!(session = %session.id.0, "Reusing advisory session");
            return Ok(Arc::clone(session));
        }

        let backend = (self.connect)().inspect_err(|e| {
            tracing::error!(error = %e, "Advisory backend unavailable");
        })?;

        let session = Arc::new(AdvisorySession::new(
            backend,
            self.model.clone(),
            system_instruction(profile),
        ));
        tracing::info!(
            session = %session.id.0,
            backend = session.backend.name(),
            model = %session.model,
            "Advisory session created"
        );

        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// The session, if one has been created
    #[must_use]
    pub fn current(&self) -> Option<Arc<AdvisorySession>> {
        self.session.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{Reply, ScriptedBackend};
    use pretty_assertions::assert_eq;

    fn priya() -> UserProfile {
        UserProfile::new("Priya", "biology", "math", "curious")
    }

    fn provider(backend: &ScriptedBackend) -> SessionProvider {
        SessionProvider::with_backend(Arc::new(backend.clone()), "mock")
    }

    #[test]
    fn test_system_instruction_embeds_profile() {
        let instruction = system_instruction(&priya());
        assert!(instruction.starts_with("You are Disha"));
        assert!(instruction.contains("- Name: Priya"));
        assert!(instruction.contains("- Interests: biology"));
        assert!(instruction.contains("- Skills: math"));
        assert!(instruction.contains("- Personality: curious"));
        assert!(instruction.contains("relevant as possible to Priya."));
        assert!(instruction.contains("warm welcome"));
    }

    #[test]
    fn test_first_create_wins() {
        let backend = ScriptedBackend::new();
        let provider = provider(&backend);

        let first = provider.create(&priya()).unwrap();
        let second = provider
            .create(&UserProfile::new("Arjun", "cricket", "leading", "bold"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.system_instruction().contains("Priya"));
        assert!(!second.system_instruction().contains("Arjun"));
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let provider = SessionProvider::new(BackendConfig::default());
        let err = provider.create(&priya()).unwrap_err();
        assert!(err.is_fatal());
        assert!(provider.current().is_none());
    }

    #[tokio::test]
    async fn test_buffered_exchange_records_history() {
        let backend = ScriptedBackend::with_replies([Reply::fragments(["Welcome, Priya!"])]);
        let session = provider(&backend).create(&priya()).unwrap();

        let reply = session.send_buffered("Hello!").await.unwrap();
        assert_eq!(reply, "Welcome, Priya!");
        assert_eq!(
            session.history(),
            vec![Turn::user("Hello!"), Turn::model("Welcome, Priya!")]
        );

        let request = &backend.requests()[0];
        assert_eq!(request.system.as_deref(), Some(session.system_instruction()));
        assert!(request.history.is_empty());
    }

    #[tokio::test]
    async fn test_buffered_failure_is_upstream() {
        let backend = ScriptedBackend::with_replies([Reply::fail("timeout")]);
        let session = provider(&backend).create(&priya()).unwrap();

        let err = session.send_buffered("Hello!").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Upstream(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_empty_buffered_reply_is_upstream() {
        let backend = ScriptedBackend::with_replies([Reply::fragments([""])]);
        let session = provider(&backend).create(&priya()).unwrap();
        assert!(session.send_buffered("Hello!").await.is_err());
    }

    #[tokio::test]
    async fn test_stream_fragments_in_order() {
        let backend = ScriptedBackend::with_replies([Reply::fragments(["Hi ", "Priya", "!"])]);
        let session = provider(&backend).create(&priya()).unwrap();

        let mut stream = session.send_streaming("Hello").await.unwrap();
        let mut fragments = Vec::new();
        while let Some(fragment) = stream.next_fragment().await {
            fragments.push(fragment.unwrap());
        }

        assert_eq!(fragments, vec!["Hi ", "Priya", "!"]);
        assert_eq!(stream.received(), "Hi Priya!");
        assert!(stream.next_fragment().await.is_none());
        assert_eq!(
            session.history(),
            vec![Turn::user("Hello"), Turn::model("Hi Priya!")]
        );
    }

    #[tokio::test]
    async fn test_stream_failure_is_terminal_and_unrecorded() {
        let backend = ScriptedBackend::with_replies([Reply::FailMidStream {
            fragments: vec!["Hi ".into()],
            error: "connection reset".into(),
        }]);
        let session = provider(&backend).create(&priya()).unwrap();

        let mut stream = session.send_streaming("Hello").await.unwrap();
        assert_eq!(stream.next_fragment().await, Some(Ok("Hi ".to_string())));
        assert!(matches!(
            stream.next_fragment().await,
            Some(Err(AdvisorError::Upstream(_)))
        ));
        assert!(stream.next_fragment().await.is_none());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_sent_with_later_requests() {
        let backend = ScriptedBackend::with_replies([
            Reply::fragments(["Welcome!"]),
            Reply::fragments(["Try ", "biotech."]),
        ]);
        let session = provider(&backend).create(&priya()).unwrap();

        session.send_buffered("Hello!").await.unwrap();
        let text = session
            .send_streaming("Ideas?")
            .await
            .unwrap()
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, "Try biotech.");

        let second = &backend.requests()[1];
        assert_eq!(
            second.history,
            vec![Turn::user("Hello!"), Turn::model("Welcome!")]
        );
        assert_eq!(session.history().len(), 4);
    }
}
