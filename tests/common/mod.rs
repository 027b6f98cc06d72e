//! Shared in-memory fakes for the collaborator ports.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use colloquy::domain::ports::{
    ConversationBackend, ListFilter, SubmitResponse, TaskFeed, TokenLedger,
};
use colloquy::{
    Conversation, ConversationId, GenerationTask, ParentTask, TaskId, TaskQueueSnapshot,
    TaskStatus, TransportError,
};

pub fn child(id: &str, status: TaskStatus) -> GenerationTask {
    GenerationTask {
        id: TaskId::from(id),
        status,
        error: None,
        job_name: format!("job-{id}"),
    }
}

pub fn parent(id: &str, children: Vec<GenerationTask>) -> ParentTask {
    ParentTask {
        parent_id: TaskId::from(id),
        children,
    }
}

pub fn snapshot(parents: Vec<ParentTask>) -> TaskQueueSnapshot {
    TaskQueueSnapshot::new(parents)
}

/// Task feed that replays a script of responses, then repeats the last
/// entry forever. Counts fetches and records cancellations.
pub struct ScriptedFeed {
    script: Mutex<VecDeque<Result<TaskQueueSnapshot, TransportError>>>,
    last: Mutex<Option<Result<TaskQueueSnapshot, TransportError>>>,
    pub fetches: AtomicU32,
    pub cancelled: Mutex<Vec<TaskId>>,
}

impl ScriptedFeed {
    pub fn new(script: Vec<Result<TaskQueueSnapshot, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            fetches: AtomicU32::new(0),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    /// A feed whose queue never drains: one child, forever processing.
    pub fn never_finishing() -> Self {
        Self::new(vec![Ok(snapshot(vec![parent(
            "P1",
            vec![child("a", TaskStatus::Processing)],
        )]))])
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskFeed for ScriptedFeed {
    async fn fetch(
        &self,
        _conversation: &ConversationId,
    ) -> Result<TaskQueueSnapshot, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if let Some(next) = script.pop_front() {
            *self.last.lock().unwrap() = Some(next.clone());
            next
        } else {
            self.last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(TaskQueueSnapshot::default()))
        }
    }

    async fn cancel(&self, task: &TaskId) -> Result<(), TransportError> {
        self.cancelled.lock().unwrap().push(task.clone());
        Ok(())
    }
}

/// Conversation backend fake with a scriptable submit response, a
/// settable remote conversation, and call counting.
pub struct FakeBackend {
    pub submit_response: Mutex<Option<Result<SubmitResponse, TransportError>>>,
    pub remote: Mutex<Option<Conversation>>,
    pub submits: AtomicU32,
    pub refreshes: AtomicU32,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            submit_response: Mutex::new(None),
            remote: Mutex::new(None),
            submits: AtomicU32::new(0),
            refreshes: AtomicU32::new(0),
        }
    }

    pub fn respond_with(&self, response: Result<SubmitResponse, TransportError>) {
        *self.submit_response.lock().unwrap() = Some(response);
    }

    pub fn set_remote(&self, conversation: Conversation) {
        *self.remote.lock().unwrap() = Some(conversation);
    }

    pub fn submit_count(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> u32 {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationBackend for FakeBackend {
    async fn submit(
        &self,
        _conversation: &ConversationId,
        _text: &str,
    ) -> Result<SubmitResponse, TransportError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.submit_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                Ok(SubmitResponse::Sync {
                    reply: "ok".into(),
                    test_update: None,
                })
            })
    }

    async fn upload(
        &self,
        conversation: &ConversationId,
        _filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<SubmitResponse, TransportError> {
        self.submit(conversation, "").await
    }

    async fn fetch_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<Conversation, TransportError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .remote
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Conversation::new(conversation.clone(), "remote")))
    }

    async fn list_conversations(
        &self,
        _filter: ListFilter,
    ) -> Result<Vec<Conversation>, TransportError> {
        Ok(self.remote.lock().unwrap().clone().into_iter().collect())
    }

    async fn create_conversation(&self) -> Result<Conversation, TransportError> {
        Ok(Conversation::new(ConversationId::from("created"), "Untitled"))
    }

    async fn rename_conversation(
        &self,
        _conversation: &ConversationId,
        _title: &str,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn trash_conversation(
        &self,
        _conversation: &ConversationId,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn restore_conversation(
        &self,
        _conversation: &ConversationId,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn purge_conversation(
        &self,
        _conversation: &ConversationId,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Ledger returning a fixed result.
pub struct StaticLedger(pub Result<Option<f64>, TransportError>);

#[async_trait]
impl TokenLedger for StaticLedger {
    async fn balance(&self) -> Result<Option<f64>, TransportError> {
        self.0.clone()
    }
}
