//! Plaza configuration
//!
//! Configuration is layered: defaults, then an optional TOML file, then
//! `PLAZA_*` environment variables. The result is validated before use.

use crate::errors::{PlazaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "PLAZA_";

/// Feed pagination and request deadlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Number of posts requested per page
    pub page_size: u32,
    /// Deadline for a single page fetch
    pub fetch_timeout_ms: u64,
    /// Deadline for a single reaction submission
    pub reaction_timeout_ms: u64,
}

impl FeedConfig {
    /// Default number of posts per page.
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    /// Default request deadline.
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    /// Page fetch deadline as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Reaction submission deadline as a duration.
    pub fn reaction_timeout(&self) -> Duration {
        Duration::from_millis(self.reaction_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
            fetch_timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            reaction_timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Local session persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file backing the key-value store; `None` keeps the session in memory
    pub storage_path: Option<PathBuf>,
    /// Key under which the auth record is cached
    pub storage_key: String,
}

impl SessionConfig {
    /// Default key of the persisted auth record.
    pub const DEFAULT_STORAGE_KEY: &'static str = "plaza_auth";
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            storage_key: Self::DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlazaConfig {
    /// Feed settings
    pub feed: FeedConfig,
    /// Session settings
    pub session: SessionConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl PlazaConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PlazaError::config(format!("invalid TOML: {e}")))
    }

    /// Load configuration from a file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            PlazaError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from an optional file, apply process environment overrides and
    /// validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PLAZA_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `PLAZA_*` overrides from the given variables. Unknown keys are
    /// ignored.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(key) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match key {
                "FEED_PAGE_SIZE" => self.feed.page_size = parse_number(key, value)?,
                "FEED_FETCH_TIMEOUT_MS" => self.feed.fetch_timeout_ms = parse_number(key, value)?,
                "FEED_REACTION_TIMEOUT_MS" => {
                    self.feed.reaction_timeout_ms = parse_number(key, value)?;
                }
                "SESSION_PATH" => self.session.storage_path = Some(PathBuf::from(value)),
                "SESSION_KEY" => self.session.storage_key = value.to_string(),
                "LOG_LEVEL" => self.logging.level = value.to_string(),
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject settings the stores cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.feed.page_size == 0 {
            return Err(PlazaError::config("feed.page_size must be greater than 0"));
        }
        if self.feed.fetch_timeout_ms == 0 {
            return Err(PlazaError::config(
                "feed.fetch_timeout_ms must be greater than 0",
            ));
        }
        if self.feed.reaction_timeout_ms == 0 {
            return Err(PlazaError::config(
                "feed.reaction_timeout_ms must be greater than 0",
            ));
        }
        if self.session.storage_key.trim().is_empty() {
            return Err(PlazaError::config("session.storage_key must not be empty"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PlazaError::config(format!("{ENV_PREFIX}{key}: '{value}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlazaConfig::default();
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.storage_key, "plaza_auth");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PlazaConfig::from_toml_str(
            r#"
            [feed]
            page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.feed.reaction_timeout_ms, FeedConfig::DEFAULT_TIMEOUT_MS);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = PlazaConfig::from_toml_str("feed = [").unwrap_err();
        assert!(matches!(err, PlazaError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PlazaConfig::default();
        config
            .apply_overrides([
                ("PLAZA_FEED_PAGE_SIZE", "5"),
                ("PLAZA_FEED_FETCH_TIMEOUT_MS", "1500"),
                ("PLAZA_LOG_LEVEL", "debug"),
                ("PLAZA_SESSION_PATH", "/tmp/session.json"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.feed.page_size, 5);
        assert_eq!(config.feed.fetch_timeout_ms, 1500);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.session.storage_path,
            Some(PathBuf::from("/tmp/session.json"))
        );
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = PlazaConfig::default();
        let err = config
            .apply_overrides([("PLAZA_FEED_PAGE_SIZE", "ten")])
            .unwrap_err();
        assert!(err.to_string().contains("PLAZA_FEED_PAGE_SIZE"));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = PlazaConfig::default();
        config.feed.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlazaConfig::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, PlazaConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plaza.toml");
        std::fs::write(&path, "[feed]\nfetch_timeout_ms = 300\n").unwrap();
        let config = PlazaConfig::load_from_file(&path).unwrap();
        assert_eq!(config.feed.fetch_timeout_ms, 300);
    }
}
