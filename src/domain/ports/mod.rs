//! Ports onto external collaborators.
//!
//! The orchestration core only ever talks to the backend through these
//! traits; the reqwest implementations live under `infrastructure::http`
//! and the tests substitute in-memory fakes.

pub mod backend;
pub mod ledger;
pub mod task_feed;

pub use backend::{ConversationBackend, ListFilter, SubmitResponse};
pub use ledger::TokenLedger;
pub use task_feed::TaskFeed;
