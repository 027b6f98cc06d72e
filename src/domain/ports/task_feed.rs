use async_trait::async_trait;

use crate::domain::errors::TransportError;
use crate::domain::models::{ConversationId, TaskId, TaskQueueSnapshot};

/// Port onto the server-side view of queued generation work.
#[async_trait]
pub trait TaskFeed: Send + Sync {
    /// Fetch the current task forest for a conversation.
    ///
    /// Every call is a fresh snapshot; implementations must not cache.
    async fn fetch(&self, conversation: &ConversationId)
        -> Result<TaskQueueSnapshot, TransportError>;

    /// Request cancellation of one child task. Advisory: the worker may
    /// have already finished, and the acknowledgement carries no payload.
    async fn cancel(&self, task: &TaskId) -> Result<(), TransportError>;
}
