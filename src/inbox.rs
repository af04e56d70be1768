//! Local inbox view reconciled against provider snapshots.

use crate::MessageSummary;
use std::collections::HashSet;

/// Messages as last reported by the provider, minus those dismissed locally.
///
/// Dismissing hides a message without deleting it remotely. Each snapshot is
/// matched by id: dismissed ids the provider still reports stay hidden, and ids
/// the provider no longer reports are forgotten.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    messages: Vec<MessageSummary>,
    dismissed: HashSet<String>,
}

impl Inbox {
    /// Empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a full provider snapshot, keeping provider order.
    pub fn apply(&mut self, snapshot: Vec<MessageSummary>) {
        let remote: HashSet<&str> = snapshot.iter().map(|m| m.id.as_str()).collect();
        self.dismissed.retain(|id| remote.contains(id.as_str()));

        self.messages = snapshot
            .into_iter()
            .filter(|m| !self.dismissed.contains(&m.id))
            .collect();
    }

    /// Hide `id` locally. Returns `false` if no visible message had that id.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        if self.messages.len() == before {
            return false;
        }
        self.dismissed.insert(id.to_string());
        true
    }

    /// Record a seen flag the provider acknowledged, until the next snapshot.
    pub fn set_seen(&mut self, id: &str, seen: bool) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.seen = seen;
        }
    }

    /// Visible messages in provider order.
    pub fn messages(&self) -> &[MessageSummary] {
        &self.messages
    }

    /// Number of visible messages not yet seen.
    pub fn unseen_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.seen).count()
    }

    /// `true` when nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
