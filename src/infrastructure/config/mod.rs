//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("api.base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("api.timeout_secs must be at least 1")]
    InvalidTimeout,

    #[error("gate.low_threshold must be positive, got {0}")]
    InvalidLowThreshold(f64),

    #[error("poller.interval_ms must be at least 100, got {0}")]
    InvalidPollInterval(u64),

    #[error("poller.max_attempts must be between 1 and 1000, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("reconciler.refresh_interval_secs must be at least 1")]
    InvalidRefreshInterval,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .colloquy/config.yaml (project config)
    /// 3. .colloquy/local.yaml (project local overrides, optional)
    /// 4. Environment variables (COLLOQUY_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".colloquy/config.yaml"))
            .merge(Yaml::file(".colloquy/local.yaml"))
            .merge(Env::prefixed("COLLOQUY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.api.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if config.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if config.gate.low_threshold <= 0.0 {
            return Err(ConfigError::InvalidLowThreshold(config.gate.low_threshold));
        }

        if config.poller.interval_ms < 100 {
            return Err(ConfigError::InvalidPollInterval(config.poller.interval_ms));
        }
        if config.poller.max_attempts == 0 || config.poller.max_attempts > 1000 {
            return Err(ConfigError::InvalidMaxAttempts(config.poller.max_attempts));
        }

        if config.reconciler.refresh_interval_secs == 0 {
            return Err(ConfigError::InvalidRefreshInterval);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
