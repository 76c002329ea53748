//! In-Memory Session Store
//!
//! Conversations live only as long as the call: they are opened when the
//! runtime starts a call and discarded when it ends. Nothing is persisted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use techsupport_core::session::SessionState;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A live conversation and its bookkeeping.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    pub state: SessionState,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Holds every open conversation, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    conversations: Mutex<HashMap<Uuid, Conversation>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new conversation, optionally for a known caller number.
    pub async fn open(&self, caller_number: Option<String>) -> Conversation {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            state: caller_number
                .map(SessionState::for_caller)
                .unwrap_or_default(),
            opened_at: now,
            updated_at: now,
        };
        self.conversations
            .lock()
            .await
            .insert(conversation.id, conversation.clone());
        conversation
    }

    pub async fn get(&self, id: Uuid) -> Option<Conversation> {
        self.conversations.lock().await.get(&id).cloned()
    }

    /// Runs `f` against a conversation's state, bumping `updated_at`.
    /// Returns `None` if the conversation does not exist.
    ///
    /// Actions are short and synchronous, so the store lock is held for the
    /// duration of `f`. This also serialises actions within a conversation.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> Option<(T, Conversation)> {
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations.get_mut(&id)?;
        let result = f(&mut conversation.state);
        conversation.updated_at = Utc::now();
        Some((result, conversation.clone()))
    }

    /// Ends a conversation and discards its state.
    pub async fn close(&self, id: Uuid) -> Option<Conversation> {
        self.conversations.lock().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use techsupport_core::workflow::Stage;

    #[tokio::test]
    async fn test_open_get_close() {
        let store = SessionStore::new();
        let opened = store.open(Some("+15550001111".to_string())).await;

        let fetched = store.get(opened.id).await.unwrap();
        assert_eq!(fetched.state.caller_number(), Some("+15550001111"));
        assert_eq!(fetched.state.stage(), Stage::Greeting);
        assert_eq!(store.len().await, 1);

        assert!(store.close(opened.id).await.is_some());
        assert!(store.get(opened.id).await.is_none());
        assert!(store.close(opened.id).await.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_conversation() {
        let store = SessionStore::new();
        let result = store.update(Uuid::new_v4(), |_| ()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let store = SessionStore::new();
        let first = store.open(None).await;
        let second = store.open(None).await;
        assert_ne!(first.id, second.id);

        let (caller, updated) = store
            .update(first.id, |state| state.caller_number().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(caller, None);
        assert!(updated.updated_at >= first.updated_at);
        assert_eq!(store.len().await, 2);
    }
}
