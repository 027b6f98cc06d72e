//! CLI command handlers.

pub mod balance;
pub mod chat;
pub mod conversation;
pub mod tasks;
