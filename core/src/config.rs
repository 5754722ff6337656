//! TOML Configuration File Support
//!
//! Centralized configuration loading for the client, supporting a TOML
//! configuration file at `~/.config/docchat/client.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest
//! first):
//! 1. CLI arguments (applied by the caller via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8000"
//! session_cookie = "session=abc123"
//!
//! [polling]
//! interval_ms = 2000
//! max_duration_secs = 600
//!
//! [streaming]
//! idle_timeout_secs = 120
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

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

/// Server section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerToml {
    /// Base URL of the document service
    pub base_url: Option<String>,

    /// Session cookie forwarded with every request
    pub session_cookie: Option<String>,
}

/// Polling section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingToml {
    /// Job status poll interval in milliseconds
    pub interval_ms: Option<u64>,

    /// Give up tracking a job after this many seconds (0 = never)
    pub max_duration_secs: Option<u64>,
}

/// Streaming section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingToml {
    /// Give up on an answer stream after this many idle seconds (0 = never)
    pub idle_timeout_secs: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Server configuration section
    pub server: ServerToml,

    /// Polling configuration section
    pub polling: PollingToml,

    /// Streaming configuration section
    pub streaming: StreamingToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Centralized configuration for the client
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the document service
    pub base_url: String,

    /// Session cookie forwarded with every request (ambient credentials)
    pub session_cookie: Option<String>,

    /// Job status poll interval
    pub poll_interval: Duration,

    /// Give up tracking a job after this long (`None` = never)
    pub max_poll_duration: Option<Duration>,

    /// Give up on an answer stream after this long without data (`None` = never)
    pub stream_idle_timeout: Option<Duration>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            session_cookie: None,
            poll_interval: Duration::from_millis(2000),
            max_poll_duration: Some(Duration::from_secs(600)),
            stream_idle_timeout: Some(Duration::from_secs(120)),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/docchat/client.toml` or
/// `~/.config/docchat/client.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("docchat").join("client.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only
///   defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if a value fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ClientToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
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

    // Environment variables override file values
    apply_env_config(&mut config)?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ClientConfig, toml: &ClientToml) -> Result<(), ConfigError> {
    if let Some(ref base_url) = toml.server.base_url {
        config.base_url = base_url.clone();
    }
    if toml.server.session_cookie.is_some() {
        config.session_cookie = toml.server.session_cookie.clone();
    }

    if let Some(interval_ms) = toml.polling.interval_ms {
        config.poll_interval = validated_interval(interval_ms)?;
    }
    if let Some(secs) = toml.polling.max_duration_secs {
        config.max_poll_duration = duration_or_unlimited(secs);
    }

    if let Some(secs) = toml.streaming.idle_timeout_secs {
        config.stream_idle_timeout = duration_or_unlimited(secs);
    }

    Ok(())
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ClientConfig) -> Result<(), ConfigError> {
    if let Ok(base_url) = std::env::var("DOCCHAT_BASE_URL") {
        config.base_url = base_url;
        config.source = ConfigSource::Env;
    }
    if let Ok(cookie) = std::env::var("DOCCHAT_SESSION_COOKIE") {
        config.session_cookie = Some(cookie);
        config.source = ConfigSource::Env;
    }
    if let Ok(interval) = std::env::var("DOCCHAT_POLL_INTERVAL_MS") {
        if let Ok(ms) = interval.parse::<u64>() {
            config.poll_interval = validated_interval(ms)?;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(max) = std::env::var("DOCCHAT_MAX_POLL_SECS") {
        if let Ok(secs) = max.parse::<u64>() {
            config.max_poll_duration = duration_or_unlimited(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(idle) = std::env::var("DOCCHAT_STREAM_IDLE_SECS") {
        if let Ok(secs) = idle.parse::<u64>() {
            config.stream_idle_timeout = duration_or_unlimited(secs);
            config.source = ConfigSource::Env;
        }
    }

    Ok(())
}

/// A poll interval must be positive
fn validated_interval(ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::ValidationError(
            "poll interval must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_millis(ms))
}

/// Zero means "no limit" for duration-style settings
fn duration_or_unlimited(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
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
    /// Base URL override
    pub base_url: Option<String>,

    /// Session cookie override
    pub session_cookie: Option<String>,

    /// Poll interval override (milliseconds)
    pub poll_interval_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL override
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set session cookie override
    #[must_use]
    pub fn with_session_cookie(mut self, cookie: String) -> Self {
        self.session_cookie = Some(cookie);
        self
    }

    /// Set poll interval override
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = Some(ms);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns an error when an override fails validation.
    pub fn apply(&self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        if self.base_url.is_some() || self.session_cookie.is_some() || self.poll_interval_ms.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ref cookie) = self.session_cookie {
            config.session_cookie = Some(cookie.clone());
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = validated_interval(ms)?;
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
