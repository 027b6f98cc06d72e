//! Domain models for the conversation orchestration core.

pub mod config;
pub mod conversation;
pub mod gate;
pub mod queue;

pub use config::{
    ApiConfig, Config, GateConfig, LoggingConfig, PollerConfig, ReconcilerConfig,
};
pub use conversation::{Conversation, ConversationId, Message, Sender};
pub use gate::{BalanceLevel, GateDecision};
pub use queue::{GenerationTask, ParentTask, TaskId, TaskQueueSnapshot, TaskStatus};
