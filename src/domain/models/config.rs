//! Configuration model.
//!
//! Loaded by `infrastructure::config::ConfigLoader` with hierarchical
//! merging (defaults, project yaml, environment).

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub gate: GateConfig,
    pub poller: PollerConfig,
    pub reconciler: ReconcilerConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            gate: GateConfig::default(),
            poller: PollerConfig::default(),
            reconciler: ReconcilerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Backend API transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the assessment backend.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Token gate admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Balances strictly below this (but above zero) are classified low.
    pub low_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { low_threshold: 10.0 }
    }
}

/// Task poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between poll iterations in milliseconds.
    pub interval_ms: u64,
    /// Maximum poll iterations before giving up on a batch.
    pub max_attempts: u32,
    /// Minimum spacing between queue-growth notifications in milliseconds.
    pub added_debounce_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 30,
            added_debounce_ms: 500,
        }
    }
}

/// Background reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Cadence of the periodic refresh of the current conversation,
    /// in seconds. Independent of poll-triggered refreshes.
    pub refresh_interval_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    pub level: String,
    /// One of: json, pretty.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
