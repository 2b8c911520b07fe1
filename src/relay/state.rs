//! Per-chat conversation state.

use std::collections::HashMap;
use std::sync::Mutex;

/// What a chat is currently being asked for. One variant per flow step, each
/// carrying exactly the data that step has accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    AwaitDirectMessage,
    AwaitGroupId,
    AwaitGroupMessage { group_id: String },
    AwaitBroadcastText,
    AwaitBroadcastConfirm { message: String },
    AwaitNewDefaultId,
    AwaitNewDefaultText,
    AwaitNewHost,
}

/// Map of chat id to its pending action. At most one entry per chat; setting
/// a new action replaces whatever was pending. Nothing here survives a
/// restart.
#[derive(Default)]
pub struct PendingStore {
    entries: Mutex<HashMap<i64, PendingAction>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, chat_id: i64, action: PendingAction) {
        self.entries.lock().expect("pending store lock poisoned").insert(chat_id, action);
    }

    /// Remove and return the chat's entry. Flows that continue re-insert the
    /// next step; everything else stays cleared.
    pub fn take(&self, chat_id: i64) -> Option<PendingAction> {
        self.entries.lock().expect("pending store lock poisoned").remove(&chat_id)
    }

    /// Clone out the chat's entry without removing it.
    pub fn peek(&self, chat_id: i64) -> Option<PendingAction> {
        self.entries.lock().expect("pending store lock poisoned").get(&chat_id).cloned()
    }

    pub fn clear(&self, chat_id: i64) {
        self.entries.lock().expect("pending store lock poisoned").remove(&chat_id);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("pending store lock poisoned").is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_take() {
        let store = PendingStore::new();
        store.set(1, PendingAction::AwaitDirectMessage);
        assert_eq!(store.take(1), Some(PendingAction::AwaitDirectMessage));
        assert_eq!(store.take(1), None);
    }

    #[test]
    fn test_peek_leaves_entry_in_place() {
        let store = PendingStore::new();
        store.set(1, PendingAction::AwaitBroadcastConfirm { message: "m".into() });
        assert!(store.peek(1).is_some());
        assert!(store.peek(1).is_some());
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let store = PendingStore::new();
        store.set(1, PendingAction::AwaitDirectMessage);
        store.set(1, PendingAction::AwaitGroupId);
        assert_eq!(store.take(1), Some(PendingAction::AwaitGroupId));
        assert!(store.is_empty());
    }

    #[test]
    fn test_entries_are_per_chat() {
        let store = PendingStore::new();
        store.set(1, PendingAction::AwaitGroupId);
        store.set(2, PendingAction::AwaitBroadcastText);
        assert_eq!(store.peek(1), Some(PendingAction::AwaitGroupId));
        assert_eq!(store.peek(2), Some(PendingAction::AwaitBroadcastText));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = PendingStore::new();
        store.set(1, PendingAction::AwaitNewHost);
        store.clear(1);
        store.clear(1);
        assert!(store.is_empty());
    }
}
