use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::TransportError;
use crate::domain::models::{Conversation, ConversationId, TaskId};

/// Server response to a message submission or artifact upload.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResponse {
    /// The backend answered inline; no background work was queued.
    Sync {
        reply: String,
        /// Updated generated artifact, when the reply changed it.
        test_update: Option<Value>,
    },
    /// The backend queued background generation work.
    Async { task_id: TaskId },
}

/// Which slice of the conversation list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    /// Active (non-deleted) conversations.
    #[default]
    Active,
    /// Soft-deleted conversations.
    Trashed,
}

/// Port onto the conversation persistence collaborator.
///
/// Covers submission, detail/list reads, and the lifecycle CRUD surface.
/// Persistence itself (schema, storage) lives entirely on the other side
/// of this trait.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Submit a user message for processing.
    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitResponse, TransportError>;

    /// Upload a user-provided artifact into the conversation.
    async fn upload(
        &self,
        conversation: &ConversationId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmitResponse, TransportError>;

    /// Fetch the full server-side detail of one conversation.
    async fn fetch_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<Conversation, TransportError>;

    /// List conversations, filtered by trash state.
    async fn list_conversations(
        &self,
        filter: ListFilter,
    ) -> Result<Vec<Conversation>, TransportError>;

    /// Create a new empty conversation server-side.
    async fn create_conversation(&self) -> Result<Conversation, TransportError>;

    /// Rename a conversation.
    async fn rename_conversation(
        &self,
        conversation: &ConversationId,
        title: &str,
    ) -> Result<(), TransportError>;

    /// Flag a conversation as soft-deleted.
    async fn trash_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), TransportError>;

    /// Clear the soft-delete flag.
    async fn restore_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), TransportError>;

    /// Permanently remove a soft-deleted conversation.
    async fn purge_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), TransportError>;
}
