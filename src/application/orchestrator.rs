//! Orchestrator: the composition root.
//!
//! Wires the token gate, poller, reconciler, lifecycle manager, and store
//! together, and is the single layer that turns classified errors into
//! user-facing outcomes. On user input it checks admission, submits, and
//! either applies a synchronous reply or hands the conversation to the
//! poll loop.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{
    BalanceLevel, Config, Conversation, ConversationId, GateDecision, Message, TaskId,
    TaskQueueSnapshot,
};
use crate::domain::ports::{
    ConversationBackend, ListFilter, SubmitResponse, TaskFeed, TokenLedger,
};
use crate::services::event_bus::{EventBus, EventEnvelope, OrchestratorEvent};
use crate::services::lifecycle::LifecycleService;
use crate::services::poller::TaskPoller;
use crate::services::reconciler::Reconciler;
use crate::services::store::ConversationStore;
use crate::services::token_gate::TokenGate;

/// What happened to a submitted message.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend replied inline; the AI message is already in the store.
    Replied { reply: String },
    /// Background generation was queued and the poll loop is running.
    Processing { task_id: TaskId },
}

/// Composition root over the orchestration services.
pub struct Orchestrator {
    gate: TokenGate,
    backend: Arc<dyn ConversationBackend>,
    feed: Arc<dyn TaskFeed>,
    store: Arc<ConversationStore>,
    reconciler: Arc<Reconciler>,
    poller: Arc<TaskPoller>,
    lifecycle: LifecycleService,
    events: EventBus,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Wire up the full orchestration stack from its ports.
    pub fn new(
        backend: Arc<dyn ConversationBackend>,
        feed: Arc<dyn TaskFeed>,
        ledger: Arc<dyn TokenLedger>,
        config: &Config,
    ) -> Self {
        let events = EventBus::default();
        let store = Arc::new(ConversationStore::new());
        let reconciler = Arc::new(Reconciler::new(
            backend.clone(),
            store.clone(),
            events.clone(),
            &config.reconciler,
        ));
        let poller = Arc::new(TaskPoller::new(
            feed.clone(),
            reconciler.clone(),
            events.clone(),
            &config.poller,
        ));
        let lifecycle = LifecycleService::new(backend.clone(), store.clone());
        let gate = TokenGate::new(ledger, &config.gate);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            gate,
            backend,
            feed,
            store,
            reconciler,
            poller,
            lifecycle,
            events,
            shutdown_tx,
        }
    }

    /// Start the periodic background reconciliation of the current
    /// conversation. Idempotent enough for one call at startup.
    pub fn start_background(&self) {
        self.reconciler.spawn_periodic(self.shutdown_tx.subscribe());
    }

    /// Stop background work: the periodic refresh and all poll loops.
    /// Server-side generation continues regardless.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        self.poller.stop_all();
    }

    /// Subscribe to orchestrator events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Run the admission check without triggering anything.
    pub async fn check_balance(&self) -> GateDecision {
        self.gate.check().await
    }

    /// The currently selected conversation, if any.
    pub async fn current_conversation(&self) -> Option<Conversation> {
        self.store.current().await
    }

    /// Whether a poll loop is running for this conversation.
    pub fn is_polling(&self, id: &ConversationId) -> bool {
        self.poller.is_polling(id)
    }

    /// Submit a user message on the current conversation.
    ///
    /// Admission-gated. The user message is appended optimistically and
    /// rolled back — exactly that one message — if the submission call
    /// fails.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, text: &str) -> OrchestratorResult<SubmitOutcome> {
        let decision = self.admit().await?;
        let id = self
            .store
            .current_id()
            .await
            .ok_or(OrchestratorError::NoActiveConversation)?;
        if !self.store.contains(&id).await {
            return Err(OrchestratorError::ConversationNotFound(id));
        }
        debug!(conversation = %id, level = %decision.level, "submitting message");

        let message = Message::user(text);
        self.store.append_message(&id, message.clone()).await;
        match self.backend.submit(&id, text).await {
            Ok(response) => self.apply_submit_response(&id, response).await,
            Err(err) => {
                // Roll back the optimistic append by identity: the one
                // sanctioned shrink of a message list, restricted to the
                // message this call added even if a merge landed meanwhile.
                self.store.retract_message(&id, &message).await;
                Err(err.into())
            }
        }
    }

    /// Upload a user-provided artifact into the current conversation.
    /// Admission-gated like any other generation trigger.
    #[instrument(skip(self, bytes))]
    pub async fn upload_artifact(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> OrchestratorResult<SubmitOutcome> {
        self.admit().await?;
        let id = self
            .store
            .current_id()
            .await
            .ok_or(OrchestratorError::NoActiveConversation)?;
        let response = self.backend.upload(&id, filename, bytes).await?;
        self.apply_submit_response(&id, response).await
    }

    async fn admit(&self) -> OrchestratorResult<GateDecision> {
        let decision = self.gate.check().await;
        if !decision.allowed {
            return Err(OrchestratorError::GateBlocked {
                level: decision.level,
            });
        }
        if decision.level == BalanceLevel::Low {
            if let Some(balance) = decision.balance {
                self.events.emit(OrchestratorEvent::LowBalance { balance });
            }
        }
        Ok(decision)
    }

    async fn apply_submit_response(
        &self,
        id: &ConversationId,
        response: SubmitResponse,
    ) -> OrchestratorResult<SubmitOutcome> {
        match response {
            SubmitResponse::Sync { reply, test_update } => {
                self.store.append_message(id, Message::ai(&reply)).await;
                if let Some(update) = test_update {
                    self.apply_artifact(id, update).await;
                }
                Ok(SubmitOutcome::Replied { reply })
            }
            SubmitResponse::Async { task_id } => {
                info!(conversation = %id, task = %task_id, "generation queued, starting poll loop");
                self.poller.start(id);
                Ok(SubmitOutcome::Processing { task_id })
            }
        }
    }

    async fn apply_artifact(&self, id: &ConversationId, update: serde_json::Value) {
        if let Some(current) = self.store.get(id).await {
            let had_artifact = current.has_artifact();
            let mut updated = current;
            updated.test_data = Some(update);
            self.store.replace(updated).await;
            self.events.emit(OrchestratorEvent::MergeApplied {
                conversation_id: id.clone(),
                has_new_artifact: !had_artifact,
            });
        }
    }

    /// Request cancellation of one child task; polling restarts
    /// immediately for the owning conversation.
    pub async fn cancel_task(
        &self,
        conversation: &ConversationId,
        task: &TaskId,
    ) -> OrchestratorResult<()> {
        self.poller.cancel_task(conversation, task).await?;
        Ok(())
    }

    /// Fetch the current task snapshot without starting a loop.
    pub async fn task_snapshot(
        &self,
        conversation: &ConversationId,
    ) -> OrchestratorResult<TaskQueueSnapshot> {
        Ok(self.feed.fetch(conversation).await?)
    }

    /// Pull the conversation list from the backend into the local cache
    /// and return the requested slice.
    pub async fn load_conversations(
        &self,
        filter: ListFilter,
    ) -> OrchestratorResult<Vec<Conversation>> {
        let remote = self.backend.list_conversations(filter).await?;
        self.store.prime(remote).await;
        Ok(self.store.list(filter).await)
    }

    /// Select a conversation, refreshing it from the server first.
    pub async fn select(&self, id: &ConversationId) -> OrchestratorResult<Conversation> {
        let merged = self.reconciler.refresh(id).await?;
        self.store.set_current(Some(id.clone())).await;
        Ok(merged)
    }

    /// Refresh one conversation through the reconciler.
    pub async fn refresh(&self, id: &ConversationId) -> OrchestratorResult<Conversation> {
        Ok(self.reconciler.refresh(id).await?)
    }

    // Lifecycle passthroughs. The lifecycle service owns the state
    // machine; the orchestrator is just the presentation seam.

    pub async fn new_conversation(&self) -> OrchestratorResult<Conversation> {
        self.lifecycle.create().await
    }

    pub async fn rename(&self, id: &ConversationId, title: &str) -> OrchestratorResult<()> {
        self.lifecycle.rename(id, title).await
    }

    pub async fn soft_delete(&self, id: &ConversationId) -> OrchestratorResult<()> {
        self.lifecycle.soft_delete(id).await
    }

    pub async fn restore(&self, id: &ConversationId) -> OrchestratorResult<()> {
        self.lifecycle.restore(id).await
    }

    pub async fn restore_all(&self) -> OrchestratorResult<Vec<ConversationId>> {
        self.lifecycle.restore_all().await
    }

    pub async fn trash_all(&self) -> OrchestratorResult<Vec<ConversationId>> {
        self.lifecycle.trash_all().await
    }

    pub async fn purge(&self, id: &ConversationId) -> OrchestratorResult<()> {
        self.lifecycle.purge(id).await
    }

    pub async fn purge_all(&self) -> OrchestratorResult<Vec<ConversationId>> {
        self.lifecycle.purge_all().await
    }

    /// Direct store access for callers that render state.
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }
}
