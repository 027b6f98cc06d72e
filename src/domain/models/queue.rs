//! Task queue view model.
//!
//! One user request fans out into a parent task owning an ordered list of
//! child generation tasks. Child status transitions are server-driven; this
//! side only observes them (cancellation requests are advisory).

use serde::{Deserialize, Serialize};

/// Opaque server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a child generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted by the worker, not yet started
    Queued,
    /// Generation in progress
    Processing,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
    /// Cancelled before completion
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "done" | "completed" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state (no further transition occurs).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// One atomic unit of generation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Present only when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Display label for the unit of work.
    pub job_name: String,
}

/// The unit of work corresponding to one user-triggered request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentTask {
    pub parent_id: TaskId,
    #[serde(default)]
    pub children: Vec<GenerationTask>,
}

impl ParentTask {
    /// A parent is complete when every child is terminal. A parent with
    /// zero children is vacuously complete.
    pub fn is_complete(&self) -> bool {
        self.children.iter().all(|c| c.status.is_terminal())
    }
}

/// Point-in-time view of a conversation's task forest.
///
/// Each fetch yields a fresh snapshot; nothing is cached. Loop logic
/// compares consecutive snapshots to detect growth and completions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQueueSnapshot {
    pub parents: Vec<ParentTask>,
}

impl TaskQueueSnapshot {
    pub fn new(parents: Vec<ParentTask>) -> Self {
        Self { parents }
    }

    /// No parents at all — nothing to wait for.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Total number of child tasks across all parents.
    pub fn total_child_count(&self) -> usize {
        self.parents.iter().map(|p| p.children.len()).sum()
    }

    /// True when every child of every parent is terminal.
    pub fn all_terminal(&self) -> bool {
        self.parents.iter().all(ParentTask::is_complete)
    }

    /// Iterate over all children across parents.
    pub fn children(&self) -> impl Iterator<Item = &GenerationTask> {
        self.parents.iter().flat_map(|p| p.children.iter())
    }

    /// Find a child's status by id.
    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.children().find(|c| &c.id == id).map(|c| c.status)
    }

    /// Children that reached `Done` in this snapshot but were non-terminal
    /// (or absent) in `previous`.
    pub fn newly_done<'a>(&'a self, previous: &Self) -> Vec<&'a GenerationTask> {
        self.children()
            .filter(|c| c.status == TaskStatus::Done)
            .filter(|c| !previous.status_of(&c.id).is_some_and(|s| s.is_terminal()))
            .collect()
    }
}
