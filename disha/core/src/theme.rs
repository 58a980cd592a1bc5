//! Theme Persistence
//!
//! Light/dark preference. The stored value wins; when nothing (or garbage)
//! is stored, the system dark-mode signal decides, else light.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, THEME_KEY};

/// Color theme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// Persisted string form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme
    #[must_use]
    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current theme, written through to the store on every change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeState {
    current: Theme,
}

impl ThemeState {
    /// Resolve the initial theme
    ///
    /// `prefers_dark` is the system preference signal; it is only consulted
    /// when no valid theme is stored.
    pub fn load(store: &dyn KeyValueStore, prefers_dark: bool) -> Self {
        let stored = match store.get(THEME_KEY) {
            Ok(value) => value.and_then(|v| match v.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring stored theme");
                    None
                }
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Theme store unreadable");
                None
            }
        };

        let current = match stored {
            Some(theme) => theme,
            None if prefers_dark => Theme::Dark,
            None => Theme::Light,
        };

        let state = Self { current };
        state.persist(store);
        state
    }

    /// Active theme
    #[must_use]
    pub fn current(&self) -> Theme {
        self.current
    }

    /// Flip between light and dark and persist the result
    pub fn toggle(&mut self, store: &dyn KeyValueStore) -> Theme {
        self.set(self.current.toggled(), store)
    }

    /// Set an explicit theme and persist it
    pub fn set(&mut self, theme: Theme, store: &dyn KeyValueStore) -> Theme {
        self.current = theme;
        self.persist(store);
        theme
    }

    fn persist(&self, store: &dyn KeyValueStore) {
        if let Err(e) = store.set(THEME_KEY, self.current.as_str()) {
            tracing::warn!(error = %e, theme = %self.current, "Failed to persist theme");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_stored_theme_wins() {
        let store = MemoryStore::with_entries([(THEME_KEY, "dark")]);
        assert_eq!(ThemeState::load(&store, false).current(), Theme::Dark);

        let store = MemoryStore::with_entries([(THEME_KEY, "light")]);
        assert_eq!(ThemeState::load(&store, true).current(), Theme::Light);
    }

    #[test]
    fn test_system_preference_fallback() {
        let store = MemoryStore::new();
        assert_eq!(ThemeState::load(&store, true).current(), Theme::Dark);

        let store = MemoryStore::new();
        assert_eq!(ThemeState::load(&store, false).current(), Theme::Light);
    }

    #[test]
    fn test_invalid_stored_theme_is_absent() {
        let store = MemoryStore::with_entries([(THEME_KEY, "purple")]);
        assert_eq!(ThemeState::load(&store, true).current(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_toggle_persists() {
        let store = MemoryStore::new();
        let mut state = ThemeState::load(&store, false);
        assert_eq!(state.toggle(&store), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(state.toggle(&store), Theme::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }
}
