//! Transcript store for the active conversation
//!
//! This module implements the ordered message container displayed in the
//! transcript pane. It holds the messages of one conversation at a time and
//! supports the reconciliation operations the send controller needs: append,
//! replace-by-local-id, remove-by-local-id, and wholesale reset on load.

use crate::chat::message::{Message, MessageId};

/// Ordered message container for one conversation
///
/// Order is strictly insertion order; reconciliation replaces a message in
/// place and never moves it relative to its neighbors. Lookup by id is a
/// linear scan, which is fine at transcript sizes.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript
    ///
    /// # Examples
    ///
    /// ```
    /// use docent::chat::Transcript;
    ///
    /// let transcript = Transcript::new();
    /// assert!(transcript.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at the end of the transcript
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces the message with the given id in place
    ///
    /// Returns false when no message carries `id`; the transcript is left
    /// untouched in that case.
    pub fn replace(&mut self, id: &MessageId, replacement: Message) -> bool {
        match self.position(id) {
            Some(index) => {
                self.messages[index] = replacement;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the message with the given id
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let index = self.position(id)?;
        Some(self.messages.remove(index))
    }

    /// Returns a mutable handle to the message with the given id
    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        let index = self.position(id)?;
        self.messages.get_mut(index)
    }

    /// Replaces the whole transcript with a freshly loaded history
    ///
    /// Loading a conversation discards any local pending or failed remnants;
    /// the server rows are the complete truth.
    pub fn reset(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Removes every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// All messages in display order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages currently held
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the transcript holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The pending message, if one exists
    ///
    /// The send controller guarantees at most one message is pending at any
    /// time, so the first match is the only match.
    pub fn pending(&self) -> Option<&Message> {
        self.messages.iter().find(|message| message.is_pending())
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|message| message.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{MessageStatus, Role};
    use chrono::Utc;

    #[test]
    fn test_new_transcript_is_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.len(), 0);
        assert!(transcript.pending().is_none());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.append(Message::confirmed(1, Role::User, "first", 1, Utc::now()));
        transcript.append(Message::confirmed(2, Role::Assistant, "second", 1, Utc::now()));
        transcript.append(Message::confirmed(3, Role::User, "third", 1, Utc::now()));

        let contents: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut transcript = Transcript::new();
        transcript.append(Message::confirmed(1, Role::User, "first", 1, Utc::now()));
        let pending = Message::pending_user("second", Some(1));
        let local_id = pending.id;
        transcript.append(pending);
        transcript.append(Message::confirmed(3, Role::User, "third", 1, Utc::now()));

        let confirmed = Message::confirmed(2, Role::User, "second", 1, Utc::now());
        assert!(transcript.replace(&local_id, confirmed));

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[1].id, MessageId::Server(2));
        assert_eq!(transcript.messages()[1].content, "second");
        assert_eq!(transcript.messages()[1].status, MessageStatus::Confirmed);
    }

    #[test]
    fn test_replace_unknown_id_is_noop() {
        let mut transcript = Transcript::new();
        transcript.append(Message::confirmed(1, Role::User, "first", 1, Utc::now()));

        let replacement = Message::confirmed(9, Role::User, "ghost", 1, Utc::now());
        assert!(!transcript.replace(&MessageId::fresh(), replacement));
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, "first");
    }

    #[test]
    fn test_remove_returns_message() {
        let mut transcript = Transcript::new();
        let pending = Message::pending_user("draft", None);
        let local_id = pending.id;
        transcript.append(pending);

        let removed = transcript.remove(&local_id);
        assert_eq!(removed.map(|m| m.content), Some("draft".to_string()));
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_returns_none() {
        let mut transcript = Transcript::new();
        transcript.append(Message::confirmed(1, Role::User, "first", 1, Utc::now()));
        assert!(transcript.remove(&MessageId::fresh()).is_none());
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_reset_discards_local_remnants() {
        let mut transcript = Transcript::new();
        transcript.append(Message::pending_user("unsent", Some(1)));

        let history = vec![
            Message::confirmed(1, Role::User, "hello", 1, Utc::now()),
            Message::confirmed(2, Role::Assistant, "hi", 1, Utc::now()),
        ];
        transcript.reset(history);

        assert_eq!(transcript.len(), 2);
        assert!(transcript.pending().is_none());
        assert_eq!(transcript.messages()[0].id, MessageId::Server(1));
    }

    #[test]
    fn test_pending_finds_the_single_pending_message() {
        let mut transcript = Transcript::new();
        transcript.append(Message::confirmed(1, Role::User, "old", 1, Utc::now()));
        let pending = Message::pending_user("new", Some(1));
        let local_id = pending.id;
        transcript.append(pending);

        assert_eq!(transcript.pending().map(|m| m.id), Some(local_id));
    }

    #[test]
    fn test_get_mut_allows_in_place_confirmation() {
        let mut transcript = Transcript::new();
        let pending = Message::pending_user("text", None);
        let local_id = pending.id;
        transcript.append(pending);

        if let Some(message) = transcript.get_mut(&local_id) {
            message.confirm_as(42, 7);
        }
        assert_eq!(transcript.messages()[0].id, MessageId::Server(42));
        assert_eq!(transcript.messages()[0].status, MessageStatus::Confirmed);
    }

    #[test]
    fn test_clear() {
        let mut transcript = Transcript::new();
        transcript.append(Message::confirmed(1, Role::User, "first", 1, Utc::now()));
        transcript.clear();
        assert!(transcript.is_empty());
    }
}
