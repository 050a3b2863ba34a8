use super::types::{Message, MessageKind, Sender};
use crate::service::{ChatRole, HistoryEntry};
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only conversation history for one session.
///
/// Insertion order defines both display order and the order presented to the
/// remote service. Mutated only by the session controller.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl ConversationHistory {
    /// Create a history seeded with the initial greeting
    pub fn seeded() -> Self {
        Self {
            messages: Arc::new(RwLock::new(vec![Message::seed_greeting()])),
        }
    }

    pub fn push(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Discard everything and start over from the seed greeting
    pub fn reseed(&self) {
        let mut messages = self.messages.write();
        messages.clear();
        messages.push(Message::seed_greeting());
    }

    /// Project the history into the remote-service contract: every non-Summary
    /// message mapped to `{role, text}` in insertion order.
    pub fn project(&self) -> Vec<HistoryEntry> {
        self.messages
            .read()
            .iter()
            .filter(|m| m.kind != MessageKind::Summary)
            .map(|m| HistoryEntry {
                role: match m.sender {
                    Sender::User => ChatRole::User,
                    Sender::Bot => ChatRole::Model,
                },
                text: m.text.clone(),
            })
            .collect()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::seeded()
    }
}
