//! Error taxonomy for the orchestration core.
//!
//! Lower layers classify and return; the orchestrator (and the CLI above
//! it) is the only layer that presents errors to the user.

use thiserror::Error;

use crate::domain::models::{BalanceLevel, ConversationId};

/// A failed interaction with an external collaborator.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Errors surfaced by orchestration operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Admission refused by the token gate. Recovered by redirecting the
    /// user to a top-up flow, never fatal.
    #[error("action blocked: token balance is {level}")]
    GateBlocked { level: BalanceLevel },

    /// Network or server failure talking to a collaborator.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Conversation creation failed; no local state was mutated.
    #[error("conversation creation failed: {0}")]
    Creation(TransportError),

    /// A bulk lifecycle operation partially failed. The succeeded subset
    /// is not rolled back, and every item is attempted regardless of
    /// earlier failures.
    #[error("bulk operation partially failed: {} of {} items failed", failed.len(), failed.len() + succeeded)]
    PartialBulk {
        succeeded: usize,
        failed: Vec<(ConversationId, OrchestratorError)>,
    },

    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("no conversation is currently selected")]
    NoActiveConversation,

    /// A lifecycle move that the state machine does not permit, e.g.
    /// purging a conversation that was never trashed.
    #[error("cannot {action} conversation {id}: it is {state}")]
    InvalidLifecycleTransition {
        id: ConversationId,
        action: &'static str,
        state: &'static str,
    },
}

impl OrchestratorError {
    /// Whether the caller should steer the user to the top-up flow.
    pub fn needs_topup_redirect(&self) -> bool {
        matches!(self, Self::GateBlocked { .. })
    }
}

/// Convenience alias used throughout the services layer.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
