//! In-process scripted gateway for unit and integration tests
//!
//! This module provides [`ScriptedGateway`], a [`Gateway`](crate::gateway::Gateway)
//! implementation backed by staged data instead of a backend. Tests stage
//! conversation rosters, per-conversation histories, and a queue of send
//! outcomes (success or failure, each with an optional delivery delay), then
//! drive the session and assert on what the gateway recorded.
//!
//! # Example
//!
//! ```
//! use docent::gateway::fake::ScriptedGateway;
//! use docent::gateway::{Gateway, GatewayError};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let gateway = ScriptedGateway::new();
//! gateway
//!     .stage_failure(GatewayError::Network("unreachable".to_string()))
//!     .await;
//!
//! let result = gateway.send_message(None, "Hello").await;
//! assert!(result.is_err());
//! assert_eq!(gateway.send_calls().await.len(), 1);
//! # }
//! ```

use crate::chat::conversations::Conversation;
use crate::chat::message::Message;
use crate::gateway::{Gateway, GatewayError, SendReply};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

/// One recorded call to [`Gateway::send_message`]
#[derive(Debug, Clone, PartialEq)]
pub struct SendCall {
    /// Conversation id the caller passed
    pub conversation_id: Option<i64>,
    /// Text the caller passed
    pub text: String,
}

/// One staged send outcome
struct SendStep {
    delay: Duration,
    outcome: Result<SendReply, GatewayError>,
}

#[derive(Default)]
struct ScriptState {
    conversations: Vec<Conversation>,
    histories: HashMap<i64, Vec<Message>>,
    send_script: VecDeque<SendStep>,
    send_calls: Vec<SendCall>,
    deleted: Vec<i64>,
}

/// Gateway whose replies are staged by the test
///
/// All staging and inspection methods take `&self`, so tests can share one
/// instance with the session through an `Arc` and keep staging outcomes
/// while the session runs. An unstaged send fails with a network error, so
/// a test that forgets to stage shows up as a failed send rather than a
/// hang.
#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptState>,
}

impl ScriptedGateway {
    /// Creates a gateway with nothing staged
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the roster returned by `list_conversations`
    pub async fn stage_conversations(&self, conversations: Vec<Conversation>) {
        self.state.lock().await.conversations = conversations;
    }

    /// Stages the history returned by `fetch_messages` for one conversation
    pub async fn stage_history(&self, conversation_id: i64, messages: Vec<Message>) {
        self.state
            .lock()
            .await
            .histories
            .insert(conversation_id, messages);
    }

    /// Queues a successful send outcome
    pub async fn stage_reply(&self, reply: SendReply) {
        self.stage_reply_after(reply, Duration::ZERO).await;
    }

    /// Queues a successful send outcome delivered after `delay`
    pub async fn stage_reply_after(&self, reply: SendReply, delay: Duration) {
        self.state.lock().await.send_script.push_back(SendStep {
            delay,
            outcome: Ok(reply),
        });
    }

    /// Queues a failed send outcome
    pub async fn stage_failure(&self, error: GatewayError) {
        self.stage_failure_after(error, Duration::ZERO).await;
    }

    /// Queues a failed send outcome delivered after `delay`
    pub async fn stage_failure_after(&self, error: GatewayError, delay: Duration) {
        self.state.lock().await.send_script.push_back(SendStep {
            delay,
            outcome: Err(error),
        });
    }

    /// Every `send_message` call recorded so far, in order
    pub async fn send_calls(&self) -> Vec<SendCall> {
        self.state.lock().await.send_calls.clone()
    }

    /// Every id passed to `delete_conversation`, in order
    pub async fn deleted_ids(&self) -> Vec<i64> {
        self.state.lock().await.deleted.clone()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, GatewayError> {
        Ok(self.state.lock().await.conversations.clone())
    }

    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<Message>, GatewayError> {
        Ok(self
            .state
            .lock()
            .await
            .histories
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        conversation_id: Option<i64>,
        text: &str,
    ) -> Result<SendReply, GatewayError> {
        let step = {
            let mut state = self.state.lock().await;
            state.send_calls.push(SendCall {
                conversation_id,
                text: text.to_string(),
            });
            state.send_script.pop_front()
        };

        match step {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.outcome
            }
            None => Err(GatewayError::Network(
                "no scripted reply staged".to_string(),
            )),
        }
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state.deleted.push(conversation_id);
        state.conversations.retain(|c| c.id != conversation_id);
        state.histories.remove(&conversation_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;
    use chrono::{TimeZone, Utc};

    fn conversation_record(id: i64) -> Conversation {
        let at = Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap();
        Conversation {
            id,
            title: format!("Conversation {}", id),
            created_at: at,
            updated_at: at,
            message_count: 2,
        }
    }

    #[tokio::test]
    async fn test_unstaged_send_fails_instead_of_hanging() {
        let gateway = ScriptedGateway::new();
        let result = gateway.send_message(None, "Hello").await;
        assert!(matches!(result, Err(GatewayError::Network(_))));
        assert_eq!(gateway.send_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_script_is_consumed_in_order() {
        let gateway = ScriptedGateway::new();
        let reply = SendReply {
            conversation: conversation_record(1),
            message: Message::confirmed(2, Role::Assistant, "Hi", 1, Utc::now()),
            user_message: None,
        };
        gateway.stage_reply(reply).await;
        gateway
            .stage_failure(GatewayError::Server {
                status: 500,
                message: "boom".to_string(),
            })
            .await;

        assert!(gateway.send_message(None, "first").await.is_ok());
        assert!(gateway.send_message(Some(1), "second").await.is_err());

        let calls = gateway.send_calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].text, "first");
        assert_eq!(calls[1].conversation_id, Some(1));
    }

    #[tokio::test]
    async fn test_delayed_reply_sleeps_before_delivery() {
        let gateway = ScriptedGateway::new();
        let reply = SendReply {
            conversation: conversation_record(1),
            message: Message::confirmed(2, Role::Assistant, "Hi", 1, Utc::now()),
            user_message: None,
        };
        gateway
            .stage_reply_after(reply, Duration::from_millis(50))
            .await;

        let started = std::time::Instant::now();
        gateway.send_message(None, "Hello").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_delete_removes_staged_conversation() {
        let gateway = ScriptedGateway::new();
        gateway
            .stage_conversations(vec![conversation_record(1), conversation_record(2)])
            .await;

        gateway.delete_conversation(1).await.unwrap();

        let remaining = gateway.list_conversations().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);
        assert_eq!(gateway.deleted_ids().await, vec![1]);
    }

    #[tokio::test]
    async fn test_fetch_messages_unknown_conversation_is_empty() {
        let gateway = ScriptedGateway::new();
        assert!(gateway.fetch_messages(9).await.unwrap().is_empty());
    }
}
