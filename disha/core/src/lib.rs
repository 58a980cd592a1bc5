//! Disha Core - Headless Career Advisor
//!
//! This crate holds every piece of state behind Disha, the career advisor for
//! students in India, independent of any UI. A terminal, web view, or test
//! harness drives it by calling operations and rendering the updates it
//! sends back.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Surfaces                              │
//! │   ┌──────────┐        ┌──────────┐        ┌──────────────┐    │
//! │   │   CLI    │        │  Web UI  │        │  Test harness│    │
//! │   └────┬─────┘        └────┬─────┘        └──────┬───────┘    │
//! │        └───────────────────┴─────────────────────┘            │
//! │                     ChatUpdate (down)                         │
//! └──────────────────────────────┼────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼────────────────────────────────┐
//! │                         DISHA CORE                            │
//! │  Profile Store ──> SessionProvider ──> ChatController         │
//! │                          │                  │   ^             │
//! │                          v                  v   │             │
//! │                    AdvisorySession   MessageTimeline          │
//! │                          │                      │             │
//! │                          v                PromptRelay         │
//! │                     LlmBackend           ^          ^         │
//! │                     (Gemini)    CareerExplorer  SkillSwipe    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`App`]: Startup wiring and long-lived state
//! - [`SessionProvider`]: Creates the run's single [`AdvisorySession`]
//! - [`ChatController`]: Greeting and streamed exchanges into the timeline
//! - [`MessageTimeline`]: Append-only chat log
//! - [`PromptRelay`]: Single-slot hand-off from other views to the chat
//! - [`Onboarding`]: Question-by-question profile collection
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use disha_core::{App, ChatAvailability, FileStore, Launch, load_config};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let store = Arc::new(FileStore::in_dir(&config.data_dir));
//!     let (app, launch) = App::launch(config, store);
//!
//!     let (tx, mut rx) = mpsc::channel(256);
//!     if let Launch::Ready(_) = launch {
//!         if let ChatAvailability::Ready(mut chat) = app.open_chat(tx) {
//!             chat.greet().await;
//!             chat.send("Which careers suit me?").await;
//!         }
//!     }
//!     while let Ok(update) = rx.try_recv() {
//!         // Render update
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`app`]: Startup order and onboarding completion
//! - [`backend`]: Advisory backend abstraction (Gemini)
//! - [`careers`]: Career catalog and explorer navigation
//! - [`chat`]: Chat controller
//! - [`config`]: TOML, environment, and CLI configuration
//! - [`error`]: Error taxonomy
//! - [`games`]: Skill Swipe
//! - [`messages`]: Message IDs and surface updates
//! - [`onboarding`]: Onboarding state machine
//! - [`profile`]: User profile records
//! - [`relay`]: Prompt relay and view router
//! - [`session`]: Advisory sessions
//! - [`store`]: Key-value persistence
//! - [`theme`]: Light/dark theme state
//! - [`timeline`]: Message timeline
//!
//! # No UI Dependencies
//!
//! Nothing here renders. Surfaces subscribe to [`ChatUpdate`] and the
//! [`ViewRouter`] and draw what they receive.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod backend;
pub mod careers;
pub mod chat;
pub mod config;
pub mod error;
pub mod games;
pub mod messages;
pub mod onboarding;
pub mod profile;
pub mod relay;
pub mod session;
pub mod store;
pub mod theme;
pub mod timeline;

// Re-exports for convenience
pub use app::{App, ChatAvailability, Launch};
pub use backend::{
    BackendConfig, GeminiBackend, LlmBackend, LlmRequest, LlmResponse, StreamingToken, Turn,
    TurnRole,
};
pub use chat::{ChatController, GREETING_FALLBACK, GREETING_PROMPT, STREAM_FALLBACK};
pub use error::{AdvisorError, OnboardingError, StoreError, TimelineError};
pub use messages::{ChatUpdate, MessageId, Sender};
pub use profile::{PartialProfile, ProfileField, UserProfile};
pub use relay::{PromptRelay, Tab, ViewRouter};
pub use session::{system_instruction, AdvisorySession, ResponseStream, SessionId, SessionProvider};
pub use store::{clear_profile, load_profile, save_profile, FileStore, KeyValueStore, MemoryStore};
pub use theme::{Theme, ThemeState};
pub use timeline::{ChatMessage, MessageTimeline};

// Onboarding exports
pub use onboarding::{Advance, InputKind, Onboarding, OnboardingStep, Phase, ONBOARDING_STEPS};

// Careers and games exports
pub use careers::{Career, CareerCategory, CareerExplorer, ExplorerView, CAREER_CATEGORIES};
pub use games::{SkillSwipe, SwipeCard, SwipePhase, SKILL_SWIPE_CARDS};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, DishaConfig, DishaToml,
};
