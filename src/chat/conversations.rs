//! Conversation summaries and the sidebar cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prompt shown before a conversation is deleted, in the TUI and the CLI
pub const DELETE_CONFIRM_PROMPT: &str = "Are you sure you want to delete this conversation?";

/// Summary record for one conversation, as tracked server-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier for the conversation
    pub id: i64,
    /// Title, auto-generated by the backend from the first message
    pub title: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation was last updated
    pub updated_at: DateTime<Utc>,
    /// Number of messages in the conversation, both roles counted
    pub message_count: u64,
}

impl Conversation {
    /// Sidebar label, e.g. `"Data retention rules · 4 messages"`
    pub fn summary_label(&self) -> String {
        format!("{} · {} messages", self.title, self.message_count)
    }
}

/// Ordered cache of conversation summaries for the sidebar
///
/// Display order is most-recently-updated first, ties broken by id
/// descending so the newest created conversation wins. The order is
/// re-established after every mutation, keeping it deterministic.
#[derive(Debug, Clone, Default)]
pub struct ConversationList {
    items: Vec<Conversation>,
}

impl ConversationList {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache wholesale with a freshly listed set
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        self.items = conversations;
        self.reorder();
    }

    /// Inserts or updates one conversation record
    ///
    /// Called with the conversation returned by every successful send. A
    /// merged record's message count never goes backwards.
    pub fn upsert(&mut self, conversation: Conversation) {
        match self.items.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => {
                let floor = existing.message_count;
                *existing = conversation;
                existing.message_count = existing.message_count.max(floor);
            }
            None => self.items.push(conversation),
        }
        self.reorder();
    }

    /// Removes a conversation after a confirmed deletion
    ///
    /// Returns false when the id was not cached.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|c| c.id != id);
        before != self.items.len()
    }

    /// Looks up a cached conversation by id
    pub fn get(&self, id: i64) -> Option<&Conversation> {
        self.items.iter().find(|c| c.id == id)
    }

    /// All cached conversations in display order
    pub fn conversations(&self) -> &[Conversation] {
        &self.items
    }

    /// Number of cached conversations
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn reorder(&mut self) {
        self.items
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn conversation(id: i64, title: &str, updated_at: DateTime<Utc>, count: u64) -> Conversation {
        Conversation {
            id,
            title: title.to_string(),
            created_at: updated_at,
            updated_at,
            message_count: count,
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_replace_all_orders_most_recent_first() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation(1, "oldest", at(0), 2),
            conversation(3, "newest", at(20), 2),
            conversation(2, "middle", at(10), 2),
        ]);

        let ids: Vec<i64> = list.conversations().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_ordering_tie_broken_by_id_descending() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation(5, "a", at(10), 1),
            conversation(9, "b", at(10), 1),
            conversation(7, "c", at(10), 1),
        ]);

        let ids: Vec<i64> = list.conversations().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![9, 7, 5]);
    }

    #[test]
    fn test_upsert_inserts_new_record() {
        let mut list = ConversationList::new();
        list.upsert(conversation(1, "first", at(0), 2));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(1).map(|c| c.title.as_str()), Some("first"));
    }

    #[test]
    fn test_upsert_updates_and_resorts() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation(1, "one", at(0), 2),
            conversation(2, "two", at(10), 2),
        ]);

        // Conversation 1 gets a new send and jumps to the top.
        list.upsert(conversation(1, "one", at(20), 4));

        let ids: Vec<i64> = list.conversations().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(list.get(1).map(|c| c.message_count), Some(4));
    }

    #[test]
    fn test_upsert_never_lowers_message_count() {
        let mut list = ConversationList::new();
        list.upsert(conversation(1, "one", at(0), 6));
        list.upsert(conversation(1, "one", at(10), 4));

        assert_eq!(list.get(1).map(|c| c.message_count), Some(6));
        assert_eq!(list.get(1).map(|c| c.updated_at), Some(at(10)));
    }

    #[test]
    fn test_remove() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation(1, "one", at(0), 2),
            conversation(2, "two", at(10), 2),
        ]);

        assert!(list.remove(1));
        assert_eq!(list.len(), 1);
        assert!(list.get(1).is_none());
        assert!(!list.remove(1));
    }

    #[test]
    fn test_summary_label_uses_naive_plural() {
        let c = conversation(1, "First message", at(0), 1);
        assert_eq!(c.summary_label(), "First message · 1 messages");
    }

    #[test]
    fn test_replace_all_discards_previous_cache() {
        let mut list = ConversationList::new();
        list.replace_all(vec![conversation(1, "one", at(0), 2)]);
        list.replace_all(vec![conversation(2, "two", at(10), 2)]);

        assert_eq!(list.len(), 1);
        assert!(list.get(1).is_none());
        assert!(list.get(2).is_some());
    }
}
