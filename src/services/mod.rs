//! Services layer: the orchestration building blocks.

pub mod event_bus;
pub mod lifecycle;
pub mod poller;
pub mod reconciler;
pub mod store;
pub mod token_gate;

pub use event_bus::{EventBus, EventEnvelope, OrchestratorEvent, StopReason};
pub use lifecycle::{BulkOutcome, LifecycleService};
pub use poller::TaskPoller;
pub use reconciler::Reconciler;
pub use store::ConversationStore;
pub use token_gate::TokenGate;
