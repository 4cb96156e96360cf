//! Conversation and send-pipeline core for Docent
//!
//! This module owns everything between the composer and the backend gateway:
//! the per-conversation transcript, the conversation roster, the single-flight
//! send controller, and the async session that ties them together.
//!
//! # Module Layout
//!
//! - `message`       -- Message model with local and server identities
//! - `transcript`    -- Ordered message list for the active conversation
//! - `conversations` -- Conversation roster ordered by recency
//! - `controller`    -- Single-flight send state machine and reconciliation
//! - `composer`      -- Multi-line input buffer and key handling
//! - `session`       -- Async glue between controller, composer, and gateway

pub mod composer;
pub mod controller;
pub mod conversations;
pub mod message;
pub mod session;
pub mod transcript;

pub use composer::{Composer, ComposerEvent};
pub use controller::{
    SendController, SendState, SendTicket, Submission, SubmitRejection, SEND_FAILURE_NOTICE,
};
pub use conversations::{Conversation, ConversationList, DELETE_CONFIRM_PROMPT};
pub use message::{Message, MessageId, MessageStatus, Role, SourceRef};
pub use session::{ChatSession, Notifier};
pub use transcript::Transcript;
