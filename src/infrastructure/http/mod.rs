//! HTTP adapters for the collaborator ports.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
