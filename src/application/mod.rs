//! Application layer: use-case composition.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, SubmitOutcome};
