//! Backend gateway for Docent
//!
//! This module defines the narrow contract the chat core consumes: list
//! conversations, fetch a conversation's messages, send a message, delete a
//! conversation. The production implementation talks HTTP to the backend;
//! tests substitute a scripted gateway behind the same trait.

pub mod fake;
pub mod http;

pub use http::HttpGateway;

use crate::chat::conversations::Conversation;
use crate::chat::message::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Failure modes at the gateway boundary
///
/// The send controller only distinguishes success from failure; the split
/// here exists for logging and for the operator-facing messages of the
/// plain CLI commands.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport failure: connectivity, timeout, or an unreadable reply
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success HTTP status
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Body text captured from the reply, when available
        message: String,
    },
}

/// Reply to a successful send
///
/// The backend always returns the assistant message and the up-to-date
/// conversation record. Some deployments also echo the confirmed user row;
/// when present it replaces the optimistic pending message wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReply {
    /// Conversation record after this exchange, used to update the sidebar
    pub conversation: Conversation,
    /// The assistant reply, grounding sources attached
    pub message: Message,
    /// The confirmed user message, when the backend echoes it
    pub user_message: Option<Message>,
}

/// Operations the chat core consumes from the backend
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Lists all conversations, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] on transport failure and
    /// [`GatewayError::Server`] on a non-success status.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, GatewayError>;

    /// Fetches the full message history of one conversation, oldest first
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] on transport failure and
    /// [`GatewayError::Server`] on a non-success status.
    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<Message>, GatewayError>;

    /// Sends one user message and returns the assistant's reply
    ///
    /// With `conversation_id` absent the backend creates a new conversation,
    /// titling it from the message text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] on transport failure and
    /// [`GatewayError::Server`] on a non-success status.
    async fn send_message(
        &self,
        conversation_id: Option<i64>,
        text: &str,
    ) -> Result<SendReply, GatewayError>;

    /// Deletes a conversation and all its messages
    ///
    /// Callers are responsible for confirming with the operator first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] on transport failure and
    /// [`GatewayError::Server`] on a non-success status.
    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let error = GatewayError::Network("connection refused".to_string());
        assert_eq!(error.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_server_error_display() {
        let error = GatewayError::Server {
            status: 500,
            message: "internal error".to_string(),
        };
        assert_eq!(error.to_string(), "Server error 500: internal error");
    }

    #[test]
    fn test_gateway_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GatewayError>();
    }

    #[test]
    fn test_gateway_is_object_safe() {
        fn assert_object_safe(_gateway: Option<&dyn Gateway>) {}
        assert_object_safe(None);
    }
}
