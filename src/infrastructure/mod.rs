//! Infrastructure layer: external integrations.

pub mod config;
pub mod http;

pub use config::{ConfigError, ConfigLoader};
pub use http::ApiClient;
