//! Broadcast-based event distribution for orchestration observers.
//!
//! The core never touches view state directly; the presentation layer
//! subscribes here and reacts to typed events with sequence numbering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::models::{ConversationId, TaskId};

/// Why a poll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every child task reached a terminal status, or the queue was empty.
    Complete,
    /// The attempt budget ran out before the batch finished. Not fatal.
    BudgetExhausted,
    /// A task feed fetch failed.
    Error,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::BudgetExhausted => write!(f, "budget_exhausted"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Events emitted by the orchestration core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// New child tasks appeared in the queue mid-batch.
    TasksAdded {
        conversation_id: ConversationId,
        total_children: usize,
    },
    /// One child task finished successfully.
    TaskCompleted {
        conversation_id: ConversationId,
        task_id: TaskId,
        job_name: String,
    },
    /// A poll loop terminated.
    PollerStopped {
        conversation_id: ConversationId,
        reason: StopReason,
    },
    /// A reconciler merge replaced the local conversation copy.
    MergeApplied {
        conversation_id: ConversationId,
        /// True when the merge newly produced a non-null generated
        /// artifact; consumers use it to auto-surface the artifact panel.
        has_new_artifact: bool,
    },
    /// The gate admitted an action on a balance below the low threshold.
    LowBalance { balance: f64 },
}

/// Event envelope with ordering metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: OrchestratorEvent,
}

/// Cloneable broadcast bus for orchestrator events.
///
/// Lagging subscribers lose the oldest events rather than blocking
/// emitters; every envelope carries a sequence number so gaps are
/// detectable.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers.
    ///
    /// Returns the assigned sequence number. Emission with no subscribers
    /// is not an error.
    pub fn emit(&self, event: OrchestratorEvent) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence,
            timestamp: Utc::now(),
            event,
        };
        tracing::debug!(sequence, event = ?envelope.event, "emitting orchestrator event");
        let _ = self.tx.send(envelope);
        sequence
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
