//! TOML Configuration File Support
//!
//! Centralized configuration loading for Disha, from an optional TOML file
//! at `~/.config/disha/disha.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! model = "gemini-2.5-flash"
//! timeout_secs = 60
//!
//! [storage]
//! data_dir = "/home/priya/.local/share/disha"
//!
//! [onboarding]
//! finish_delay_ms = 1500
//!
//! [appearance]
//! prefer_dark = true
//! ```
//!
//! The API key is normally taken from `GEMINI_API_KEY`. A missing key is not
//! a configuration error: it disables the chat when the session is created.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Model identifier
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// API key (prefer the environment)
    pub api_key: Option<String>,
}

/// Storage section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageToml {
    /// Directory holding `storage.json`
    pub data_dir: Option<PathBuf>,
}

/// Onboarding section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingToml {
    /// Pause between the last answer and the completed profile
    pub finish_delay_ms: Option<u64>,
}

/// Appearance section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceToml {
    /// System dark-mode preference, used when no theme is stored
    pub prefer_dark: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DishaToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Storage configuration section
    pub storage: StorageToml,

    /// Onboarding configuration section
    pub onboarding: OnboardingToml,

    /// Appearance configuration section
    pub appearance: AppearanceToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for a run
#[derive(Clone, Debug)]
pub struct DishaConfig {
    /// Advisory backend connection
    pub backend: BackendConfig,

    /// Directory for persisted key-value data
    pub data_dir: PathBuf,

    /// Onboarding finishing delay
    pub finish_delay: Duration,

    /// System dark-mode preference
    pub prefer_dark: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for DishaConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            data_dir: default_data_dir(),
            finish_delay: Duration::from_millis(Self::DEFAULT_FINISH_DELAY_MS),
            prefer_dark: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl DishaConfig {
    /// Default onboarding finishing delay in milliseconds
    pub const DEFAULT_FINISH_DELAY_MS: u64 = 1500;

    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Reject values no run can work with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.model must not be empty".to_string(),
            ));
        }
        if !self.backend.base_url.starts_with("http") {
            return Err(ConfigError::ValidationError(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            )));
        }
        if self.backend.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "backend.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/disha/disha.toml` or
/// `~/.config/disha/disha.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("disha").join("disha.toml"))
}

/// Default data directory, `$XDG_DATA_HOME/disha`
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".disha"), |p| p.join("disha"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] afterwards.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<DishaConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// If `path` is `None`, only defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<DishaConfig, ConfigError> {
    let mut config = DishaConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: DishaToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config_from(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut DishaConfig, toml: &DishaToml) {
    if let Some(ref model) = toml.backend.model {
        config.backend.model.clone_from(model);
    }
    if let Some(ref url) = toml.backend.base_url {
        config.backend.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = toml.backend.timeout_secs {
        config.backend.timeout = Duration::from_secs(secs);
    }
    if let Some(ref key) = toml.backend.api_key {
        config.backend.api_key = Some(key.clone());
    }

    if let Some(ref dir) = toml.storage.data_dir {
        config.data_dir.clone_from(dir);
    }

    if let Some(ms) = toml.onboarding.finish_delay_ms {
        config.finish_delay = Duration::from_millis(ms);
    }

    if let Some(dark) = toml.appearance.prefer_dark {
        config.prefer_dark = dark;
    }
}

/// Apply environment overrides read through `lookup`
///
/// `lookup` is normally `|key| std::env::var(key).ok()`. Unparsable numeric
/// values are ignored with a warning.
pub fn apply_env_config_from<F>(config: &mut DishaConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let key = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY"));
    if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
        config.backend.api_key = Some(key);
        config.source = ConfigSource::Env;
    }

    if let Some(model) = lookup("DISHA_MODEL") {
        config.backend.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = lookup("DISHA_BASE_URL") {
        config.backend.base_url = url.trim_end_matches('/').to_string();
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = lookup("DISHA_TIMEOUT_SECS") {
        match timeout.parse::<u64>() {
            Ok(secs) => {
                config.backend.timeout = Duration::from_secs(secs);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid DISHA_TIMEOUT_SECS"),
        }
    }

    if let Some(dir) = lookup("DISHA_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
        config.source = ConfigSource::Env;
    }

    if let Some(dark) = lookup("DISHA_PREFER_DARK") {
        config.prefer_dark = dark != "0" && !dark.eq_ignore_ascii_case("false");
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Model override
    pub model: Option<String>,

    /// Data directory override
    pub data_dir: Option<PathBuf>,

    /// Dark-mode preference override
    pub prefer_dark: Option<bool>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set data directory override
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set dark-mode preference override
    #[must_use]
    pub fn with_prefer_dark(mut self, dark: bool) -> Self {
        self.prefer_dark = Some(dark);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut DishaConfig) {
        if self.model.is_some() || self.data_dir.is_some() || self.prefer_dark.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref model) = self.model {
            config.backend.model.clone_from(model);
        }
        if let Some(ref dir) = self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(dark) = self.prefer_dark {
            config.prefer_dark = dark;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
