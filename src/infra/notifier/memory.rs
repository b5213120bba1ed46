//! In-memory owner notifier.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::{OwnerId, OwnerNotifier};

/// A message delivered to an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerMessage {
    /// Message text.
    pub text: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Notifier that keeps every message per owner, for development and testing.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    messages: Mutex<HashMap<OwnerId, Vec<OwnerMessage>>>,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent to `owner`, oldest first.
    pub fn messages_for(&self, owner: OwnerId) -> Vec<OwnerMessage> {
        self.messages.lock().get(&owner).cloned().unwrap_or_default()
    }

    /// Message texts sent to `owner`, oldest first.
    pub fn texts_for(&self, owner: OwnerId) -> Vec<String> {
        self.messages
            .lock()
            .get(&owner)
            .map(|msgs| msgs.iter().map(|m| m.text.clone()).collect())
            .unwrap_or_default()
    }

    /// How many messages to `owner` equal `text`.
    pub fn count_text(&self, owner: OwnerId, text: &str) -> usize {
        self.messages
            .lock()
            .get(&owner)
            .map_or(0, |msgs| msgs.iter().filter(|m| m.text == text).count())
    }

    /// Total messages across all owners.
    pub fn len(&self) -> usize {
        self.messages.lock().values().map(Vec::len).sum()
    }

    /// Whether nothing was sent yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OwnerNotifier for InMemoryNotifier {
    fn say(&self, owner: OwnerId, message: &str) {
        self.messages
            .lock()
            .entry(owner)
            .or_default()
            .push(OwnerMessage {
                text: message.to_string(),
                created_at_ms: crate::util::clock::now_ms(),
            });
    }
}
