//! Conversation state reconciler.
//!
//! Merges the locally held (optimistic) conversation with the
//! server-authoritative copy. Merge conflicts are never surfaced as
//! errors; every divergence resolves deterministically, keeping the core
//! available-over-consistent.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::domain::errors::TransportError;
use crate::domain::models::{Conversation, ConversationId, ReconcilerConfig};
use crate::domain::ports::ConversationBackend;
use crate::services::event_bus::{EventBus, OrchestratorEvent};
use crate::services::store::ConversationStore;

/// Field-by-field merge of local and remote conversation state, plus the
/// refresh operation that applies it to the store.
pub struct Reconciler {
    backend: Arc<dyn ConversationBackend>,
    store: Arc<ConversationStore>,
    events: EventBus,
    refresh_interval: Duration,
}

impl Reconciler {
    pub fn new(
        backend: Arc<dyn ConversationBackend>,
        store: Arc<ConversationStore>,
        events: EventBus,
        config: &ReconcilerConfig,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            refresh_interval: Duration::from_secs(config.refresh_interval_secs),
        }
    }

    /// Merge two snapshots of the same conversation. Pure; the only bridge
    /// between the local and server tiers.
    ///
    /// Rules:
    /// - `messages`: the longer list wins. Message lists are append-only in
    ///   normal operation, so the longer side has observed more activity
    ///   and is a superset in the common case. On a tie the local side
    ///   wins, preserving optimistic edits.
    /// - `test_data`: remote when present (the server is authoritative for
    ///   generated artifacts), local otherwise.
    /// - `title`: local when the user explicitly renamed in this session,
    ///   remote otherwise.
    /// - `deleted`: remote is authoritative.
    pub fn merge(local: &Conversation, remote: &Conversation) -> Conversation {
        let messages = if remote.messages.len() > local.messages.len() {
            remote.messages.clone()
        } else {
            local.messages.clone()
        };
        let test_data = remote
            .test_data
            .clone()
            .or_else(|| local.test_data.clone());
        let title = if local.title_edited {
            local.title.clone()
        } else {
            remote.title.clone()
        };
        Conversation {
            id: local.id.clone(),
            title,
            messages,
            test_data,
            deleted: remote.deleted,
            title_edited: local.title_edited,
        }
    }

    /// Fetch the remote detail, merge against the store copy, and replace
    /// the stored object. Emits `MergeApplied` with `has_new_artifact` set
    /// when the merge first produced a generated artifact.
    #[instrument(skip(self), fields(conversation = %id))]
    pub async fn refresh(&self, id: &ConversationId) -> Result<Conversation, TransportError> {
        let remote = self.backend.fetch_conversation(id).await?;
        let local = self.store.get(id).await;

        let had_artifact = local.as_ref().is_some_and(Conversation::has_artifact);
        let merged = match &local {
            Some(local) => Self::merge(local, &remote),
            None => remote,
        };
        let has_new_artifact = merged.has_artifact() && !had_artifact;

        debug!(
            messages = merged.message_count(),
            has_new_artifact, "applying merged conversation"
        );
        self.store.replace(merged.clone()).await;
        self.events.emit(OrchestratorEvent::MergeApplied {
            conversation_id: id.clone(),
            has_new_artifact,
        });
        Ok(merged)
    }

    /// Spawn the periodic background refresh of the currently selected
    /// conversation. Catches changes produced outside this session,
    /// independent of poll-triggered refreshes. Runs until a shutdown
    /// signal arrives.
    pub fn spawn_periodic(
        self: &Arc<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(reconciler.refresh_interval);
            // The first tick fires immediately; skip it so the cadence
            // starts one full interval after startup.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let Some(current) = reconciler.store.current_id().await else {
                            continue;
                        };
                        if let Err(err) = reconciler.refresh(&current).await {
                            warn!(error = %err, conversation = %current, "periodic refresh failed");
                        }
                    }
                    _ = shutdown.recv() => {
                        debug!("periodic reconciliation stopping");
                        break;
                    }
                }
            }
        })
    }
}
