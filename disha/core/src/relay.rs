//! Prompt Relay and View Router
//!
//! The career explorer and the Skill Swipe game never talk to the chat
//! directly. They drop a synthesized prompt into the [`PromptRelay`], which
//! switches the [`ViewRouter`] to [`Tab::Chat`]; the chat surface consumes
//! the prompt once when it becomes active.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Top-level views of the application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Conversation with the advisor
    #[default]
    Chat,
    /// Career explorer
    Careers,
    /// Skill Swipe game
    Games,
}

impl Tab {
    /// All tabs, in display order
    pub const ALL: [Tab; 3] = [Tab::Chat, Tab::Careers, Tab::Games];

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Chat => "chat",
            Tab::Careers => "careers",
            Tab::Games => "games",
        }
    }
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Tab::Chat),
            "careers" => Ok(Tab::Careers),
            "games" | "game" => Ok(Tab::Games),
            other => Err(format!("unknown tab '{other}'")),
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active-tab state shared between views
///
/// Cloning yields another handle to the same state. Surfaces that need to
/// react to tab switches hold a [`watch::Receiver`] from [`Self::subscribe`].
#[derive(Clone, Debug)]
pub struct ViewRouter {
    tx: Arc<watch::Sender<Tab>>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new(Tab::default())
    }
}

impl ViewRouter {
    /// Router starting on `initial`
    #[must_use]
    pub fn new(initial: Tab) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Switch the active tab
    pub fn activate(&self, tab: Tab) {
        let previous = self.tx.send_replace(tab);
        if previous != tab {
            tracing::debug!(from = %previous, to = %tab, "Active tab changed");
        }
    }

    /// Currently active tab
    #[must_use]
    pub fn active(&self) -> Tab {
        *self.tx.borrow()
    }

    /// Receiver notified on every switch
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Tab> {
        self.tx.subscribe()
    }
}

/// Single-slot mailbox for prompts bound for the chat
///
/// Last writer wins; there is no queue.
#[derive(Clone, Debug)]
pub struct PromptRelay {
    pending: Arc<Mutex<Option<String>>>,
    router: ViewRouter,
}

impl PromptRelay {
    /// Relay that switches `router` to the chat on every offer
    #[must_use]
    pub fn new(router: ViewRouter) -> Self {
        Self {
            pending: Arc::new(Mutex::new(None)),
            router,
        }
    }

    /// Store `prompt` as the pending value and activate the chat
    pub fn offer(&self, prompt: impl Into<String>) {
        let replaced = self.pending.lock().replace(prompt.into()).is_some();
        if replaced {
            tracing::debug!("Unconsumed prompt overwritten");
        }
        tracing::info!("Prompt offered to chat");
        self.router.activate(Tab::Chat);
    }

    /// Take the pending prompt, leaving the slot empty
    #[must_use]
    pub fn consume(&self) -> Option<String> {
        self.pending.lock().take()
    }

    /// Whether a prompt is waiting
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// The router this relay drives
    #[must_use]
    pub fn router(&self) -> &ViewRouter {
        &self.router
    }
}
