//! Message types for the chat transcript
//!
//! This module defines the message model shared by the transcript, the send
//! controller, and the backend gateway: roles, delivery status, and the
//! two-phase identifier scheme used for optimistic sends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a transcript message
///
/// A message submitted by the operator starts life with a locally generated
/// `Local` id; the server-assigned `Server` id replaces it once the send is
/// confirmed. Messages loaded from the backend always carry `Server` ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Locally generated id for a message not yet confirmed by the server
    Local(Uuid),
    /// Server-assigned id
    Server(i64),
}

impl MessageId {
    /// Generates a fresh local id
    pub fn fresh() -> Self {
        Self::Local(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(uuid) => write!(f, "local-{}", uuid),
            Self::Server(id) => write!(f, "{}", id),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Operator-authored message
    User,
    /// Assistant reply from the backend
    Assistant,
}

impl Role {
    /// Returns the wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a transcript message
///
/// A message appended optimistically at submit time is `Pending`; it becomes
/// `Confirmed` when the send succeeds, or `Failed` in the instant before the
/// rollback removes it from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Appended locally, awaiting server confirmation
    Pending,
    /// Acknowledged by the server
    Confirmed,
    /// Send failed; the message is removed right after this transition
    Failed,
}

/// Reference to a grounding passage attached to an assistant reply
///
/// The backend answers questions against an indexed document corpus and
/// reports which regulation sections or document chunks the reply drew on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source kind reported by the backend ("regulation" or "document")
    #[serde(rename = "type")]
    pub kind: String,
    /// Regulation or document title, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Section identifier within a regulation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// File path of a document chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Originating corpus name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SourceRef {
    /// Returns a short human-readable label for display under a reply
    pub fn label(&self) -> String {
        let name = self
            .title
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or("document");
        match &self.section {
            Some(section) => format!("{} §{}", name, section),
            None => name.to_string(),
        }
    }
}

/// A single transcript message
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Message identifier (local until confirmed)
    pub id: MessageId,
    /// Sender role
    pub role: Role,
    /// Conversation the message belongs to; `None` for an optimistic message
    /// sent from a draft conversation the server has not created yet
    pub conversation_id: Option<i64>,
    /// Message text
    pub content: String,
    /// Creation time (local clock until confirmed)
    pub created_at: DateTime<Utc>,
    /// Delivery status
    pub status: MessageStatus,
    /// Grounding passages, populated on assistant replies only
    pub sources: Vec<SourceRef>,
}

impl Message {
    /// Creates a pending user message for optimistic insertion
    ///
    /// # Arguments
    ///
    /// * `content` - The message text as submitted
    /// * `conversation_id` - The active conversation, or `None` for a draft
    ///
    /// # Examples
    ///
    /// ```
    /// use docent::chat::{Message, MessageStatus, Role};
    ///
    /// let msg = Message::pending_user("Hello", Some(7));
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.status, MessageStatus::Pending);
    /// assert_eq!(msg.conversation_id, Some(7));
    /// ```
    pub fn pending_user(content: impl Into<String>, conversation_id: Option<i64>) -> Self {
        Self {
            id: MessageId::fresh(),
            role: Role::User,
            conversation_id,
            content: content.into(),
            created_at: Utc::now(),
            status: MessageStatus::Pending,
            sources: Vec::new(),
        }
    }

    /// Creates a confirmed message, as decoded from a backend row
    ///
    /// # Arguments
    ///
    /// * `id` - Server-assigned message id
    /// * `role` - Sender role
    /// * `content` - Message text
    /// * `conversation_id` - Owning conversation
    /// * `created_at` - Server-reported creation time
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use docent::chat::{Message, MessageStatus, Role};
    ///
    /// let msg = Message::confirmed(42, Role::Assistant, "Hi", 7, Utc::now());
    /// assert_eq!(msg.status, MessageStatus::Confirmed);
    /// ```
    pub fn confirmed(
        id: i64,
        role: Role,
        content: impl Into<String>,
        conversation_id: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::Server(id),
            role,
            conversation_id: Some(conversation_id),
            content: content.into(),
            created_at,
            status: MessageStatus::Confirmed,
            sources: Vec::new(),
        }
    }

    /// Attaches grounding sources and returns self for builder-style use
    pub fn with_sources(mut self, sources: Vec<SourceRef>) -> Self {
        self.sources = sources;
        self
    }

    /// True while the message awaits server confirmation
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }

    /// Confirms this message in place with a server-assigned id
    pub fn confirm_as(&mut self, server_id: i64, conversation_id: i64) {
        self.id = MessageId::Server(server_id);
        self.conversation_id = Some(conversation_id);
        self.status = MessageStatus::Confirmed;
    }

    /// Confirms this message in place without a server id
    ///
    /// Used when a send reply omits the confirmed user row; the local id is
    /// kept until the next wholesale transcript load replaces it.
    pub fn confirm_in_place(&mut self, conversation_id: i64) {
        self.conversation_id = Some(conversation_id);
        self.status = MessageStatus::Confirmed;
    }
}
