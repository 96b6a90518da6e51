//! Configuration loaded from TOML with environment overrides.

use std::fmt;
use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::identity::SaltedDigest;

/// Environment variable overriding [`FolditConfig::secret_key`].
pub const SECRET_KEY_ENV: &str = "FOLDIT_SECRET_KEY";

/// Settings for the progress store.
#[derive(Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct FolditConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Secret mixed into anonymized user ids.
    #[serde(default)]
    secret_key: Option<String>,

    /// Number of leaderboard rows shown by default.
    #[serde(default = "default_leaderboard_size")]
    leaderboard_size: usize,

    /// Puzzles ranked on the leaderboard.
    #[serde(default)]
    leaderboard_puzzles: Vec<i32>,
}

fn default_database_path() -> String {
    "foldit.db".to_string()
}

fn default_leaderboard_size() -> usize {
    10
}

impl fmt::Debug for FolditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolditConfig")
            .field("database_path", &self.database_path)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***REDACTED***"))
            .field("leaderboard_size", &self.leaderboard_size)
            .field("leaderboard_puzzles", &self.leaderboard_puzzles)
            .finish()
    }
}

impl Default for FolditConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            secret_key: None,
            leaderboard_size: default_leaderboard_size(),
            leaderboard_puzzles: Vec::new(),
        }
    }
}

impl FolditConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(database_path = %config.database_path, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Applies [`SECRET_KEY_ENV`] if it is set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var(SECRET_KEY_ENV) {
            debug!("Secret key taken from environment");
            self.secret_key = Some(secret);
        }
        self
    }

    /// Replaces the database path.
    pub fn with_database_path(mut self, database_path: String) -> Self {
        self.database_path = database_path;
        self
    }

    /// Replaces the secret key.
    pub fn with_secret_key(mut self, secret_key: String) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    /// Builds the anonymized id derivation from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no non-empty secret is configured.
    #[instrument(skip(self))]
    pub fn identity(&self) -> Result<SaltedDigest, ConfigError> {
        match self.secret_key.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(SaltedDigest::new(secret)),
            _ => Err(ConfigError::new(format!(
                "No secret key configured; set `secret_key` or {}",
                SECRET_KEY_ENV
            ))),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
