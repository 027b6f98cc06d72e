//! In-memory conversation store.
//!
//! The single shared mutable resource of the core. Holds the local
//! (optimistic) tier of every known conversation plus the current
//! selection; the server-side copy is the other tier, and `Reconciler::
//! merge` is the only bridge between them.
//!
//! All mutations are whole-object replacements keyed by conversation id.
//! Concurrent refreshes therefore race at merge granularity only, which is
//! the accepted last-writer-wins model. This is an advisory cache, never a
//! source of truth.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::models::{Conversation, ConversationId, Message};
use crate::domain::ports::ListFilter;

#[derive(Default)]
struct StoreInner {
    conversations: HashMap<ConversationId, Conversation>,
    /// Display order, newest first. Create prepends.
    order: Vec<ConversationId>,
    current: Option<ConversationId>,
}

/// Shared conversation cache with a current-selection pointer.
#[derive(Default)]
pub struct ConversationStore {
    inner: RwLock<StoreInner>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or insert) a conversation wholesale.
    pub async fn replace(&self, conversation: Conversation) {
        let mut inner = self.inner.write().await;
        let id = conversation.id.clone();
        if inner.conversations.insert(id.clone(), conversation).is_none() {
            inner.order.push(id);
        }
    }

    /// Insert a freshly created conversation at the front of the list and
    /// select it.
    pub async fn insert_front(&self, conversation: Conversation) {
        let mut inner = self.inner.write().await;
        let id = conversation.id.clone();
        inner.conversations.insert(id.clone(), conversation);
        inner.order.retain(|existing| existing != &id);
        inner.order.insert(0, id.clone());
        inner.current = Some(id);
    }

    /// Seed conversations from a server list without clobbering local
    /// copies that already exist (those converge via refresh instead).
    pub async fn prime(&self, conversations: Vec<Conversation>) {
        let mut inner = self.inner.write().await;
        for conversation in conversations {
            let id = conversation.id.clone();
            if !inner.conversations.contains_key(&id) {
                inner.conversations.insert(id.clone(), conversation);
                inner.order.push(id);
            }
        }
    }

    pub async fn get(&self, id: &ConversationId) -> Option<Conversation> {
        self.inner.read().await.conversations.get(id).cloned()
    }

    pub async fn contains(&self, id: &ConversationId) -> bool {
        self.inner.read().await.conversations.contains_key(id)
    }

    /// Remove a conversation entirely (purge). Clears the current
    /// selection if it pointed at the removed conversation.
    pub async fn remove(&self, id: &ConversationId) -> Option<Conversation> {
        let mut inner = self.inner.write().await;
        let removed = inner.conversations.remove(id);
        if removed.is_some() {
            inner.order.retain(|existing| existing != id);
            if inner.current.as_ref() == Some(id) {
                inner.current = None;
            }
        }
        removed
    }

    /// Conversations matching the trash filter, in display order.
    pub async fn list(&self, filter: ListFilter) -> Vec<Conversation> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.conversations.get(id))
            .filter(|c| match filter {
                ListFilter::Active => !c.deleted,
                ListFilter::Trashed => c.deleted,
            })
            .cloned()
            .collect()
    }

    /// Ids matching the trash filter, in display order.
    pub async fn ids(&self, filter: ListFilter) -> Vec<ConversationId> {
        self.list(filter).await.into_iter().map(|c| c.id).collect()
    }

    pub async fn set_current(&self, id: Option<ConversationId>) {
        self.inner.write().await.current = id;
    }

    pub async fn current_id(&self) -> Option<ConversationId> {
        self.inner.read().await.current.clone()
    }

    pub async fn current(&self) -> Option<Conversation> {
        let inner = self.inner.read().await;
        inner
            .current
            .as_ref()
            .and_then(|id| inner.conversations.get(id))
            .cloned()
    }

    /// Append a message, replacing the stored object. Returns false when
    /// the conversation is unknown.
    pub async fn append_message(&self, id: &ConversationId, message: Message) -> bool {
        let mut inner = self.inner.write().await;
        match inner.conversations.get(id) {
            Some(existing) => {
                let mut updated = existing.clone();
                updated.messages.push(message);
                inner.conversations.insert(id.clone(), updated);
                true
            }
            None => false,
        }
    }

    /// Remove the most recent occurrence of exactly this message. The
    /// rollback path for a failed optimistic submission; the only
    /// sanctioned shrink of a message list. Matching by value keeps the
    /// rollback exact even when a concurrent merge appended behind it.
    /// Returns whether anything was removed.
    pub async fn retract_message(&self, id: &ConversationId, message: &Message) -> bool {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.conversations.get(id) else {
            return false;
        };
        let mut updated = existing.clone();
        let Some(position) = updated.messages.iter().rposition(|m| m == message) else {
            return false;
        };
        updated.messages.remove(position);
        inner.conversations.insert(id.clone(), updated);
        true
    }

    /// Flip the soft-delete flag. Returns the previous value, or None when
    /// the conversation is unknown.
    pub async fn set_deleted(&self, id: &ConversationId, deleted: bool) -> Option<bool> {
        let mut inner = self.inner.write().await;
        let existing = inner.conversations.get(id)?;
        let previous = existing.deleted;
        let mut updated = existing.clone();
        updated.deleted = deleted;
        inner.conversations.insert(id.clone(), updated);
        Some(previous)
    }

    /// Record an explicit user rename. The edit marker makes the local
    /// title win subsequent merges. Returns the previous title and edit
    /// marker so a failed confirmation can revert, or None when the
    /// conversation is unknown.
    pub async fn set_title(
        &self,
        id: &ConversationId,
        title: impl Into<String>,
    ) -> Option<(String, bool)> {
        let mut inner = self.inner.write().await;
        let existing = inner.conversations.get(id)?;
        let previous = (existing.title.clone(), existing.title_edited);
        let mut updated = existing.clone();
        updated.title = title.into();
        updated.title_edited = true;
        inner.conversations.insert(id.clone(), updated);
        Some(previous)
    }

    /// Put a captured title and edit marker back after a failed rename
    /// confirmation.
    pub async fn revert_title(&self, id: &ConversationId, title: String, edited: bool) {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.conversations.get(id) {
            let mut updated = existing.clone();
            updated.title = title;
            updated.title_edited = edited;
            inner.conversations.insert(id.clone(), updated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: &str) -> Conversation {
        Conversation::new(ConversationId::from(id), format!("title-{id}"))
    }

    #[tokio::test]
    async fn test_insert_front_selects_and_orders() {
        let store = ConversationStore::new();
        store.replace(conv("old")).await;
        store.insert_front(conv("new")).await;

        let ids = store.ids(ListFilter::Active).await;
        assert_eq!(ids[0], ConversationId::from("new"));
        assert_eq!(store.current_id().await, Some(ConversationId::from("new")));
    }

    #[tokio::test]
    async fn test_append_and_rollback_restores_prior_state() {
        let store = ConversationStore::new();
        store.replace(conv("C1")).await;
        let id = ConversationId::from("C1");

        let two = Message::user("two");
        store.append_message(&id, Message::user("one")).await;
        store.append_message(&id, two.clone()).await;
        assert_eq!(store.get(&id).await.unwrap().message_count(), 2);

        assert!(store.retract_message(&id, &two).await);
        let after = store.get(&id).await.unwrap();
        assert_eq!(after.message_count(), 1);
        assert_eq!(after.messages[0].text, "one");

        // Already gone: nothing else is removed.
        assert!(!store.retract_message(&id, &two).await);
        assert_eq!(store.get(&id).await.unwrap().message_count(), 1);
    }

    #[tokio::test]
    async fn test_retract_targets_exact_message() {
        let store = ConversationStore::new();
        store.replace(conv("C1")).await;
        let id = ConversationId::from("C1");

        let mine = Message::user("mine");
        store.append_message(&id, mine.clone()).await;
        // A merge lands another message behind the optimistic one.
        store.append_message(&id, Message::ai("landed later")).await;

        assert!(store.retract_message(&id, &mine).await);
        let after = store.get(&id).await.unwrap();
        assert_eq!(after.message_count(), 1);
        assert_eq!(after.messages[0].text, "landed later");
    }

    #[tokio::test]
    async fn test_list_filters_by_trash_state() {
        let store = ConversationStore::new();
        store.replace(conv("a")).await;
        store.replace(conv("b")).await;
        store.set_deleted(&ConversationId::from("b"), true).await;

        assert_eq!(store.list(ListFilter::Active).await.len(), 1);
        assert_eq!(store.list(ListFilter::Trashed).await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_clears_current_selection() {
        let store = ConversationStore::new();
        store.insert_front(conv("C1")).await;
        store.remove(&ConversationId::from("C1")).await;
        assert_eq!(store.current_id().await, None);
        assert!(!store.contains(&ConversationId::from("C1")).await);
    }

    #[tokio::test]
    async fn test_prime_keeps_existing_local_copies() {
        let store = ConversationStore::new();
        let mut local = conv("C1");
        local.messages.push(Message::user("optimistic"));
        store.replace(local).await;

        store.prime(vec![conv("C1"), conv("C2")]).await;

        // The local copy with its optimistic message survives priming.
        assert_eq!(
            store.get(&ConversationId::from("C1")).await.unwrap().message_count(),
            1
        );
        assert!(store.contains(&ConversationId::from("C2")).await);
    }

    #[tokio::test]
    async fn test_set_title_marks_edit() {
        let store = ConversationStore::new();
        store.replace(conv("C1")).await;
        let previous = store.set_title(&ConversationId::from("C1"), "Renamed").await;
        assert_eq!(previous, Some(("title-C1".to_string(), false)));
        let updated = store.get(&ConversationId::from("C1")).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.title_edited);
    }
}
