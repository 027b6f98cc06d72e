//! Wire types for the assessment backend REST API.
//!
//! Deliberately lenient where the backend is known to be loose (the
//! balance field, the sync-reply field name) and strict where looseness
//! would corrupt orchestration state (task statuses, senders).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::errors::TransportError;
use crate::domain::models::{
    Conversation, ConversationId, GenerationTask, Message, ParentTask, Sender, TaskId,
    TaskQueueSnapshot, TaskStatus,
};
use crate::domain::ports::SubmitResponse;

/// `GET /balance` response. The field arrives as whatever the ledger
/// serializes; anything non-numeric counts as no balance.
#[derive(Debug, Deserialize)]
pub struct BalanceWire {
    #[serde(default)]
    pub wallet_balance: Option<Value>,
}

impl BalanceWire {
    pub fn balance(&self) -> Option<f64> {
        self.wallet_balance.as_ref().and_then(Value::as_f64)
    }
}

/// `POST .../messages` response: either queued background work or an
/// inline reply (under either of two historical field names).
#[derive(Debug, Deserialize)]
pub struct SubmitWire {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ai_task_id: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub test_update: Option<Value>,
}

impl SubmitWire {
    pub fn into_domain(self) -> Result<SubmitResponse, TransportError> {
        if self.status.as_deref() == Some("processing") {
            let task_id = self.ai_task_id.ok_or_else(|| {
                TransportError::Decode("processing response without ai_task_id".into())
            })?;
            return Ok(SubmitResponse::Async {
                task_id: TaskId::new(task_id),
            });
        }
        let reply = self.reply.or(self.message).ok_or_else(|| {
            TransportError::Decode("submit response carried neither task nor reply".into())
        })?;
        Ok(SubmitResponse::Sync {
            reply,
            test_update: self.test_update,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskWire {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub job_name: String,
}

impl TaskWire {
    fn into_domain(self) -> Result<GenerationTask, TransportError> {
        let status = TaskStatus::from_str(&self.status).ok_or_else(|| {
            TransportError::Decode(format!("unknown task status: {}", self.status))
        })?;
        Ok(GenerationTask {
            id: TaskId::new(self.id),
            status,
            error: self.error,
            job_name: self.job_name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ParentTaskWire {
    pub parent_id: String,
    #[serde(default)]
    pub children: Vec<TaskWire>,
}

/// `GET .../tasks` response.
#[derive(Debug, Deserialize)]
pub struct TasksWire {
    #[serde(default)]
    pub tasks: Vec<ParentTaskWire>,
}

impl TasksWire {
    pub fn into_domain(self) -> Result<TaskQueueSnapshot, TransportError> {
        let parents = self
            .tasks
            .into_iter()
            .map(|parent| {
                let children = parent
                    .children
                    .into_iter()
                    .map(TaskWire::into_domain)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ParentTask {
                    parent_id: TaskId::new(parent.parent_id),
                    children,
                })
            })
            .collect::<Result<Vec<_>, TransportError>>()?;
        Ok(TaskQueueSnapshot::new(parents))
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageWire {
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ai_task_ids: Vec<String>,
}

impl MessageWire {
    fn into_domain(self) -> Result<Message, TransportError> {
        let sender = match self.sender.as_str() {
            "user" => Sender::User,
            "ai" => Sender::Ai,
            other => {
                return Err(TransportError::Decode(format!(
                    "unknown message sender: {other}"
                )))
            }
        };
        Ok(Message {
            sender,
            text: self.text,
            timestamp: self.timestamp,
            ai_task_ids: self.ai_task_ids.into_iter().map(TaskId::new).collect(),
        })
    }
}

/// Conversation detail / list element.
#[derive(Debug, Deserialize)]
pub struct ConversationWire {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<MessageWire>,
    #[serde(default, alias = "test_update")]
    pub test_data: Option<Value>,
    #[serde(default)]
    pub deleted: bool,
}

impl ConversationWire {
    pub fn into_domain(self) -> Result<Conversation, TransportError> {
        let messages = self
            .messages
            .into_iter()
            .map(MessageWire::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Conversation {
            id: ConversationId::new(self.id),
            title: self.title,
            messages,
            test_data: self.test_data,
            deleted: self.deleted,
            title_edited: false,
        })
    }
}
