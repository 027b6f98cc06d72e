//! Colloquy - AI Conversation Orchestration Core
//!
//! Colloquy manages long-running asynchronous AI generation work queued
//! against a chat-style conversation: it gates every generation trigger
//! behind a metered-token admission check, polls background job status,
//! and reconciles optimistic local conversation state with the
//! authoritative server copy.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and the error taxonomy
//! - **Services Layer** (`services`): Gate, poller, reconciler, lifecycle
//! - **Application Layer** (`application`): The orchestrator composition root
//! - **Infrastructure Layer** (`infrastructure`): HTTP adapters and config
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use colloquy::application::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire ports and send a message
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Orchestrator, SubmitOutcome};
pub use domain::errors::{OrchestratorError, OrchestratorResult, TransportError};
pub use domain::models::{
    BalanceLevel, Config, Conversation, ConversationId, GateDecision, GenerationTask, Message,
    ParentTask, Sender, TaskId, TaskQueueSnapshot, TaskStatus,
};
pub use domain::ports::{ConversationBackend, ListFilter, SubmitResponse, TaskFeed, TokenLedger};
pub use infrastructure::{ApiClient, ConfigError, ConfigLoader};
pub use services::{
    ConversationStore, EventBus, LifecycleService, OrchestratorEvent, Reconciler, StopReason,
    TaskPoller, TokenGate,
};
