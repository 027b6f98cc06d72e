//! Conversation domain model.
//!
//! A conversation is a chat-style exchange between a user and the AI
//! generation backend, plus the structured test artifact that generation
//! work eventually attaches to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::queue::TaskId;

/// Opaque server-assigned conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Generation tasks this message's content is attributed to.
    /// Only populated on AI messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ai_task_ids: Vec<TaskId>,
}

impl Message {
    /// Build a user-authored message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
            ai_task_ids: Vec::new(),
        }
    }

    /// Build an AI-authored message stamped with the current time.
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
            timestamp: Utc::now(),
            ai_task_ids: Vec::new(),
        }
    }

    /// Attach the generation tasks that produced this message.
    pub fn with_task_ids(mut self, ids: Vec<TaskId>) -> Self {
        self.ai_task_ids = ids;
        self
    }
}

/// A conversation with its messages and generated artifact.
///
/// The `messages` sequence is append-only under normal operation; the one
/// sanctioned shrink is the rollback of an optimistic user message after a
/// failed submission, and that removes exactly the message that was
/// appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Structured artifact produced by AI generation (e.g. a generated
    /// test definition). Opaque to the orchestration core.
    #[serde(default)]
    pub test_data: Option<serde_json::Value>,
    /// Soft-delete flag. Server-authoritative.
    #[serde(default)]
    pub deleted: bool,
    /// Set when the user explicitly renamed the conversation in this
    /// session. Local bookkeeping only, never sent to or read from the
    /// server; it decides which side's title survives a merge.
    #[serde(skip)]
    pub title_edited: bool,
}

impl Conversation {
    /// Create a fresh local representation of a server-created conversation.
    pub fn new(id: ConversationId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
            test_data: None,
            deleted: false,
            title_edited: false,
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn has_artifact(&self) -> bool {
        self.test_data.is_some()
    }
}
