//! Conversation lifecycle management.
//!
//! Per-conversation state machine: active -> trashed -> purged, with a
//! back-edge trashed -> active (restore). Purge is reachable only from
//! trashed. Bulk variants are non-transactional: a partial failure is
//! reported once as an aggregate error and the succeeded subset stays
//! applied.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{Conversation, ConversationId};
use crate::domain::ports::{ConversationBackend, ListFilter};
use crate::services::store::ConversationStore;

/// Outcome of a bulk lifecycle operation.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<ConversationId>,
    pub failed: Vec<(ConversationId, OrchestratorError)>,
}

impl BulkOutcome {
    /// Collapse into a result: an aggregate error when anything failed.
    pub fn into_result(self) -> OrchestratorResult<Vec<ConversationId>> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(OrchestratorError::PartialBulk {
                succeeded: self.succeeded.len(),
                failed: self.failed,
            })
        }
    }
}

/// Creation, trash, restore, and purge of conversations.
pub struct LifecycleService {
    backend: Arc<dyn ConversationBackend>,
    store: Arc<ConversationStore>,
}

impl LifecycleService {
    pub fn new(backend: Arc<dyn ConversationBackend>, store: Arc<ConversationStore>) -> Self {
        Self { backend, store }
    }

    /// Create a new conversation, prepend it to the active list, and
    /// select it. On backend failure no local state is mutated.
    #[instrument(skip(self))]
    pub async fn create(&self) -> OrchestratorResult<Conversation> {
        let conversation = self
            .backend
            .create_conversation()
            .await
            .map_err(OrchestratorError::Creation)?;
        info!(conversation = %conversation.id, "conversation created");
        self.store.insert_front(conversation.clone()).await;
        Ok(conversation)
    }

    /// Rename a conversation. The local edit marker makes the new title
    /// survive merges against stale server copies. The optimistic title is
    /// put back if the confirming call fails.
    #[instrument(skip(self, title), fields(conversation = %id))]
    pub async fn rename(&self, id: &ConversationId, title: &str) -> OrchestratorResult<()> {
        let previous = self
            .store
            .set_title(id, title)
            .await
            .ok_or_else(|| OrchestratorError::ConversationNotFound(id.clone()))?;
        if let Err(err) = self.backend.rename_conversation(id, title).await {
            warn!(error = %err, "rename confirmation failed, reverting title");
            let (title, edited) = previous;
            self.store.revert_title(id, title, edited).await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Move an active conversation to the trash. The local flag flips
    /// optimistically and is reverted if the confirming call fails.
    #[instrument(skip(self), fields(conversation = %id))]
    pub async fn soft_delete(&self, id: &ConversationId) -> OrchestratorResult<()> {
        match self.store.set_deleted(id, true).await {
            None => return Err(OrchestratorError::ConversationNotFound(id.clone())),
            Some(true) => {
                return Err(OrchestratorError::InvalidLifecycleTransition {
                    id: id.clone(),
                    action: "trash",
                    state: "trashed",
                })
            }
            Some(false) => {}
        }
        if let Err(err) = self.backend.trash_conversation(id).await {
            warn!(error = %err, "trash confirmation failed, reverting local flag");
            self.store.set_deleted(id, false).await;
            return Err(err.into());
        }
        info!("conversation trashed");
        Ok(())
    }

    /// Move a trashed conversation back to the active list.
    #[instrument(skip(self), fields(conversation = %id))]
    pub async fn restore(&self, id: &ConversationId) -> OrchestratorResult<()> {
        match self.store.set_deleted(id, false).await {
            None => return Err(OrchestratorError::ConversationNotFound(id.clone())),
            Some(false) => {
                return Err(OrchestratorError::InvalidLifecycleTransition {
                    id: id.clone(),
                    action: "restore",
                    state: "active",
                })
            }
            Some(true) => {}
        }
        if let Err(err) = self.backend.restore_conversation(id).await {
            warn!(error = %err, "restore confirmation failed, reverting local flag");
            self.store.set_deleted(id, true).await;
            return Err(err.into());
        }
        info!("conversation restored");
        Ok(())
    }

    /// Permanently remove a trashed conversation. Rejected outright for
    /// conversations still active: everything passes through the trash
    /// first.
    #[instrument(skip(self), fields(conversation = %id))]
    pub async fn purge(&self, id: &ConversationId) -> OrchestratorResult<()> {
        let conversation = self
            .store
            .get(id)
            .await
            .ok_or_else(|| OrchestratorError::ConversationNotFound(id.clone()))?;
        if !conversation.deleted {
            return Err(OrchestratorError::InvalidLifecycleTransition {
                id: id.clone(),
                action: "purge",
                state: "active",
            });
        }
        self.backend.purge_conversation(id).await?;
        self.store.remove(id).await;
        info!("conversation purged");
        Ok(())
    }

    /// Move every active conversation to the trash. Non-transactional.
    #[instrument(skip(self))]
    pub async fn trash_all(&self) -> OrchestratorResult<Vec<ConversationId>> {
        let ids = self.store.ids(ListFilter::Active).await;
        self.bulk(ids, BulkOp::Trash).await
    }

    /// Restore every trashed conversation. Non-transactional.
    #[instrument(skip(self))]
    pub async fn restore_all(&self) -> OrchestratorResult<Vec<ConversationId>> {
        let ids = self.store.ids(ListFilter::Trashed).await;
        self.bulk(ids, BulkOp::Restore).await
    }

    /// Permanently remove every trashed conversation. Non-transactional.
    #[instrument(skip(self))]
    pub async fn purge_all(&self) -> OrchestratorResult<Vec<ConversationId>> {
        let ids = self.store.ids(ListFilter::Trashed).await;
        self.bulk(ids, BulkOp::Purge).await
    }

    /// Apply one lifecycle operation per id, sequentially, collecting
    /// per-id failures. Per-id requests keep partial failures attributable
    /// to specific conversations; nothing is rolled back and every id is
    /// attempted, even when an item fails for a non-transport reason (a
    /// concurrent merge can flip a flag between snapshot and apply).
    async fn bulk(
        &self,
        ids: Vec<ConversationId>,
        op: BulkOp,
    ) -> OrchestratorResult<Vec<ConversationId>> {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = match op {
                BulkOp::Trash => self.soft_delete(&id).await,
                BulkOp::Restore => self.restore(&id).await,
                BulkOp::Purge => self.purge(&id).await,
            };
            match result {
                Ok(()) => outcome.succeeded.push(id),
                Err(err) => {
                    warn!(conversation = %id, error = %err, "bulk item failed");
                    outcome.failed.push((id, err));
                }
            }
        }
        outcome.into_result()
    }
}

#[derive(Debug, Clone, Copy)]
enum BulkOp {
    Trash,
    Restore,
    Purge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use crate::domain::errors::TransportError;
    use crate::domain::ports::SubmitResponse;

    /// Backend fake with per-id failure injection and a creation switch.
    /// The flip hook mutates the store on the first trash call, standing
    /// in for a concurrent merge landing mid-bulk.
    #[derive(Default)]
    struct FakeBackend {
        fail_ids: Mutex<HashSet<String>>,
        fail_create: Mutex<bool>,
        created: Mutex<u32>,
        flip_on_first_trash: Mutex<Option<(Arc<ConversationStore>, ConversationId)>>,
    }

    impl FakeBackend {
        fn fail_on(&self, id: &str) {
            self.fail_ids.lock().unwrap().insert(id.to_string());
        }

        fn check(&self, id: &ConversationId) -> Result<(), TransportError> {
            if self.fail_ids.lock().unwrap().contains(id.as_str()) {
                Err(TransportError::Status {
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ConversationBackend for FakeBackend {
        async fn submit(
            &self,
            _conversation: &ConversationId,
            _text: &str,
        ) -> Result<SubmitResponse, TransportError> {
            unimplemented!("not exercised by lifecycle tests")
        }

        async fn upload(
            &self,
            _conversation: &ConversationId,
            _filename: &str,
            _bytes: Vec<u8>,
        ) -> Result<SubmitResponse, TransportError> {
            unimplemented!("not exercised by lifecycle tests")
        }

        async fn fetch_conversation(
            &self,
            conversation: &ConversationId,
        ) -> Result<Conversation, TransportError> {
            Ok(Conversation::new(conversation.clone(), "remote"))
        }

        async fn list_conversations(
            &self,
            _filter: ListFilter,
        ) -> Result<Vec<Conversation>, TransportError> {
            Ok(vec![])
        }

        async fn create_conversation(&self) -> Result<Conversation, TransportError> {
            if *self.fail_create.lock().unwrap() {
                return Err(TransportError::Network("refused".into()));
            }
            let mut created = self.created.lock().unwrap();
            *created += 1;
            Ok(Conversation::new(
                ConversationId::new(format!("new-{created}")),
                "Untitled",
            ))
        }

        async fn rename_conversation(
            &self,
            conversation: &ConversationId,
            _title: &str,
        ) -> Result<(), TransportError> {
            self.check(conversation)
        }

        async fn trash_conversation(
            &self,
            conversation: &ConversationId,
        ) -> Result<(), TransportError> {
            let flip = self.flip_on_first_trash.lock().unwrap().take();
            if let Some((store, target)) = flip {
                store.set_deleted(&target, true).await;
            }
            self.check(conversation)
        }

        async fn restore_conversation(
            &self,
            conversation: &ConversationId,
        ) -> Result<(), TransportError> {
            self.check(conversation)
        }

        async fn purge_conversation(
            &self,
            conversation: &ConversationId,
        ) -> Result<(), TransportError> {
            self.check(conversation)
        }
    }

    async fn seeded(ids: &[&str]) -> (Arc<FakeBackend>, Arc<ConversationStore>, LifecycleService) {
        let backend = Arc::new(FakeBackend::default());
        let store = Arc::new(ConversationStore::new());
        for id in ids {
            store
                .replace(Conversation::new(ConversationId::from(*id), *id))
                .await;
        }
        let service = LifecycleService::new(backend.clone(), store.clone());
        (backend, store, service)
    }

    #[tokio::test]
    async fn test_create_prepends_and_selects() {
        let (_backend, store, service) = seeded(&["existing"]).await;
        let created = service.create().await.unwrap();
        assert_eq!(store.current_id().await, Some(created.id.clone()));
        assert_eq!(store.ids(ListFilter::Active).await[0], created.id);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_state_untouched() {
        let (backend, store, service) = seeded(&["existing"]).await;
        *backend.fail_create.lock().unwrap() = true;

        let err = service.create().await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Creation(_)));
        assert_eq!(store.ids(ListFilter::Active).await.len(), 1);
        assert_eq!(store.current_id().await, None);
    }

    #[tokio::test]
    async fn test_trash_then_restore_round_trip() {
        let (_backend, store, service) = seeded(&["C1"]).await;
        let id = ConversationId::from("C1");

        service.soft_delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().deleted);

        service.restore(&id).await.unwrap();
        let restored = store.get(&id).await.unwrap();
        assert!(!restored.deleted);
        assert_eq!(store.list(ListFilter::Trashed).await.len(), 0);
    }

    #[tokio::test]
    async fn test_failed_trash_reverts_optimistic_flip() {
        let (backend, store, service) = seeded(&["C1"]).await;
        backend.fail_on("C1");
        let id = ConversationId::from("C1");

        let err = service.soft_delete(&id).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Transport(_)));
        assert!(!store.get(&id).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn test_purge_rejected_while_active() {
        let (_backend, store, service) = seeded(&["C1"]).await;
        let id = ConversationId::from("C1");

        let err = service.purge(&id).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidLifecycleTransition { action: "purge", .. }
        ));
        assert!(store.contains(&id).await);
    }

    #[tokio::test]
    async fn test_purge_after_trash_removes() {
        let (_backend, store, service) = seeded(&["C1"]).await;
        let id = ConversationId::from("C1");

        service.soft_delete(&id).await.unwrap();
        service.purge(&id).await.unwrap();
        assert!(!store.contains(&id).await);
    }

    #[tokio::test]
    async fn test_bulk_partial_failure_is_aggregated() {
        let (backend, store, service) = seeded(&["a", "b", "c"]).await;
        backend.fail_on("b");

        let err = service.trash_all().await.unwrap_err();
        match err {
            OrchestratorError::PartialBulk { succeeded, failed } => {
                assert_eq!(succeeded, 2);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, ConversationId::from("b"));
                assert!(matches!(failed[0].1, OrchestratorError::Transport(_)));
            }
            other => panic!("expected PartialBulk, got {other:?}"),
        }
        // Succeeded subset stays applied.
        assert_eq!(store.list(ListFilter::Trashed).await.len(), 2);
        assert!(!store.get(&ConversationId::from("b")).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn test_bulk_aggregates_items_flipped_mid_operation() {
        let (backend, store, service) = seeded(&["a", "b", "c"]).await;
        // While "a" is being trashed, "b" goes trashed behind the bulk's
        // back; trashing it again is then an invalid transition.
        *backend.flip_on_first_trash.lock().unwrap() =
            Some((store.clone(), ConversationId::from("b")));

        let err = service.trash_all().await.unwrap_err();
        match err {
            OrchestratorError::PartialBulk { succeeded, failed } => {
                assert_eq!(succeeded, 2);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, ConversationId::from("b"));
                assert!(matches!(
                    failed[0].1,
                    OrchestratorError::InvalidLifecycleTransition { .. }
                ));
            }
            other => panic!("expected PartialBulk, got {other:?}"),
        }
        // The ids after the failed one were still attempted.
        assert!(store.get(&ConversationId::from("c")).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn test_failed_rename_reverts_title() {
        let (backend, store, service) = seeded(&["C1"]).await;
        backend.fail_on("C1");
        let id = ConversationId::from("C1");

        let err = service.rename(&id, "New name").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Transport(_)));
        let after = store.get(&id).await.unwrap();
        assert_eq!(after.title, "C1");
        assert!(!after.title_edited);
    }

    #[tokio::test]
    async fn test_restore_all_empties_trash() {
        let (_backend, store, service) = seeded(&["a", "b"]).await;
        service.trash_all().await.unwrap();
        let restored = service.restore_all().await.unwrap();
        assert_eq!(restored.len(), 2);
        assert!(store.list(ListFilter::Trashed).await.is_empty());
    }

    #[tokio::test]
    async fn test_purge_all_only_touches_trash() {
        let (_backend, store, service) = seeded(&["keep", "drop"]).await;
        service.soft_delete(&ConversationId::from("drop")).await.unwrap();

        let purged = service.purge_all().await.unwrap();
        assert_eq!(purged, vec![ConversationId::from("drop")]);
        assert!(store.contains(&ConversationId::from("keep")).await);
    }
}
