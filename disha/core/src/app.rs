//! Application Bootstrap
//!
//! Wires the pieces together in startup order:
//!
//! ```text
//! config -> store -> profile? -> theme -> session provider
//!                       |
//!                       +-- missing/malformed --> onboarding
//! ```
//!
//! The [`App`] owns every long-lived state container and hands out
//! references; surfaces never build them themselves. Careers and games keep
//! working when the advisor cannot be configured.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::chat::ChatController;
use crate::config::DishaConfig;
use crate::error::AdvisorError;
use crate::messages::ChatUpdate;
use crate::onboarding::Onboarding;
use crate::profile::UserProfile;
use crate::relay::{PromptRelay, ViewRouter};
use crate::session::SessionProvider;
use crate::store::{self, KeyValueStore};
use crate::theme::{Theme, ThemeState};

/// Where the app starts
#[derive(Debug)]
pub enum Launch {
    /// No usable profile; collect one first
    Onboarding(Onboarding),
    /// A saved profile was loaded
    Ready(UserProfile),
}

/// Whether the chat can be used this run
#[derive(Debug)]
pub enum ChatAvailability {
    /// Advisor configured; controller ready for the greeting
    Ready(ChatController),
    /// Advisor cannot be configured; the reason is fatal for chat only
    Unavailable(AdvisorError),
}

/// Long-lived application state
pub struct App {
    config: DishaConfig,
    store: Arc<dyn KeyValueStore>,
    theme: ThemeState,
    provider: SessionProvider,
    profile: Option<UserProfile>,
    router: ViewRouter,
    relay: PromptRelay,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("theme", &self.theme.current())
            .field("profile", &self.profile.as_ref().map(|p| p.name.as_str()))
            .field("tab", &self.router.active())
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Start the app against the Gemini backend described by `config`
    pub fn launch(config: DishaConfig, store: Arc<dyn KeyValueStore>) -> (Self, Launch) {
        let provider = SessionProvider::new(config.backend.clone());
        Self::launch_with(config, store, provider)
    }

    /// Start the app with an explicit session provider
    pub fn launch_with(
        config: DishaConfig,
        store: Arc<dyn KeyValueStore>,
        provider: SessionProvider,
    ) -> (Self, Launch) {
        let profile = store::load_profile(store.as_ref());
        let theme = ThemeState::load(store.as_ref(), config.prefer_dark);
        let router = ViewRouter::default();
        let relay = PromptRelay::new(router.clone());

        let app = Self {
            config,
            store,
            theme,
            provider,
            profile: profile.clone(),
            router,
            relay,
        };

        let launch = match profile {
            Some(profile) => {
                tracing::info!(name = %profile.name, theme = %app.theme.current(), "Profile loaded");
                if let Err(e) = app.provider.create(&profile) {
                    tracing::warn!(error = %e, "Chat unavailable for this run");
                }
                Launch::Ready(profile)
            }
            None => {
                tracing::info!("No saved profile, starting onboarding");
                Launch::Onboarding(Onboarding::new())
            }
        };

        (app, launch)
    }

    /// Persist a freshly onboarded profile and open the chat
    ///
    /// A failed write is logged; the profile is still used for this run.
    pub fn complete_onboarding(
        &mut self,
        profile: UserProfile,
        tx: mpsc::Sender<ChatUpdate>,
    ) -> ChatAvailability {
        if let Err(e) = store::save_profile(self.store.as_ref(), &profile) {
            tracing::warn!(error = %e, "Profile not persisted, onboarding will repeat next run");
        }
        self.profile = Some(profile);
        self.open_chat(tx)
    }

    /// Chat controller bound to the run's session
    ///
    /// Unavailable until a profile exists.
    pub fn open_chat(&self, tx: mpsc::Sender<ChatUpdate>) -> ChatAvailability {
        let Some(profile) = self.profile.as_ref() else {
            return ChatAvailability::Unavailable(AdvisorError::Configuration(
                "no profile yet".to_string(),
            ));
        };
        match self.provider.create(profile) {
            Ok(session) => ChatAvailability::Ready(ChatController::new(session, tx)),
            Err(e) => ChatAvailability::Unavailable(e),
        }
    }

    /// Profile in effect, if onboarding has completed
    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Active theme
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    /// Flip the theme and persist it
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle(self.store.as_ref())
    }

    /// Tab router
    #[must_use]
    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    /// Prompt relay into the chat
    #[must_use]
    pub fn relay(&self) -> &PromptRelay {
        &self.relay
    }

    /// Configuration the app was launched with
    #[must_use]
    pub fn config(&self) -> &DishaConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::ScriptedBackend;
    use crate::backend::BackendConfig;
    use crate::store::{MemoryStore, PROFILE_KEY, THEME_KEY};

    fn scripted() -> SessionProvider {
        SessionProvider::with_backend(Arc::new(ScriptedBackend::new()), "mock")
    }

    fn saved_profile() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([(
            PROFILE_KEY,
            r#"{"name":"Priya","interests":"biology","skills":"math","personality":"curious"}"#,
        )]))
    }

    #[test]
    fn test_launch_without_profile_onboards() {
        let store = Arc::new(MemoryStore::new());
        let (app, launch) = App::launch_with(DishaConfig::default(), store, scripted());

        assert!(matches!(launch, Launch::Onboarding(_)));
        assert!(app.profile().is_none());
    }

    #[test]
    fn test_launch_with_profile_is_ready() {
        let (app, launch) = App::launch_with(DishaConfig::default(), saved_profile(), scripted());

        assert!(matches!(launch, Launch::Ready(ref p) if p.name == "Priya"));
        assert!(matches!(
            app.open_chat(mpsc::channel(8).0),
            ChatAvailability::Ready(_)
        ));
    }

    #[test]
    fn test_missing_credential_only_disables_chat() {
        let mut config = DishaConfig::default();
        config.backend = BackendConfig::default();
        let (app, launch) = App::launch(config, saved_profile());

        assert!(matches!(launch, Launch::Ready(_)));
        match app.open_chat(mpsc::channel(8).0) {
            ChatAvailability::Unavailable(e) => assert!(e.is_fatal()),
            ChatAvailability::Ready(_) => panic!("chat should be unavailable"),
        }
        assert!(app.relay().consume().is_none());
    }

    #[test]
    fn test_complete_onboarding_persists_profile() {
        let store = Arc::new(MemoryStore::new());
        let (mut app, _) = App::launch_with(DishaConfig::default(), store.clone(), scripted());

        let profile = UserProfile::new("Arjun", "cricket", "leading", "bold");
        let chat = app.complete_onboarding(profile.clone(), mpsc::channel(8).0);

        assert!(matches!(chat, ChatAvailability::Ready(_)));
        assert_eq!(store::load_profile(store.as_ref()), Some(profile));
    }

    #[test]
    fn test_theme_toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let (mut app, _) = App::launch_with(DishaConfig::default(), store.clone(), scripted());

        assert_eq!(app.theme(), Theme::Light);
        assert_eq!(app.toggle_theme(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }
}
