//! HTTP gateway implementation
//!
//! This module implements the [`Gateway`](crate::gateway::Gateway) trait
//! against the backend's REST API. Wire row shapes live here as private
//! structs; the rest of the crate only sees the chat model types.

use crate::chat::conversations::Conversation;
use crate::chat::message::{Message, Role, SourceRef};
use crate::config::ApiConfig;
use crate::gateway::{Gateway, GatewayError, SendReply};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gateway speaking the backend's REST protocol
///
/// One instance is shared across the session; requests carry the bearer
/// token resolved at construction time.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Conversation row as returned by the backend
#[derive(Debug, Deserialize)]
struct ConversationRow {
    id: i64,
    title: Option<String>,
    created_at: String,
    updated_at: String,
    message_count: u64,
}

/// Message row as returned by the backend
#[derive(Debug, Deserialize)]
struct MessageRow {
    id: i64,
    conversation_id: i64,
    role: Role,
    content: String,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    created_at: String,
}

/// Body of `POST /chat`
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<i64>,
}

/// Reply of `POST /chat`
#[derive(Debug, Deserialize)]
struct SendReplyBody {
    message: MessageRow,
    conversation: ConversationRow,
    #[serde(default)]
    sources: Option<Vec<SourceRef>>,
    #[serde(default)]
    user_message: Option<MessageRow>,
}

/// Reply of `DELETE /chat/conversations/{id}`
#[derive(Debug, Deserialize)]
struct OkBody {
    ok: bool,
}

/// Reply of `POST /auth/login`
#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
}

impl ConversationRow {
    fn into_conversation(self) -> Conversation {
        Conversation {
            id: self.id,
            title: self.title.unwrap_or_else(|| "(untitled)".to_string()),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
            message_count: self.message_count,
        }
    }
}

impl MessageRow {
    fn into_message(self) -> Message {
        let sources = self
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get("sources"))
            .and_then(|value| serde_json::from_value::<Vec<SourceRef>>(value.clone()).ok())
            .unwrap_or_default();
        Message::confirmed(
            self.id,
            self.role,
            self.content,
            self.conversation_id,
            parse_timestamp(&self.created_at),
        )
        .with_sources(sources)
    }
}

/// Parses a backend timestamp
///
/// The backend emits RFC 3339 in most deployments but plain
/// `YYYY-MM-DD HH:MM:SS` strings when rows come straight from the database.
/// An unparseable value degrades to the current time with a warning, since
/// timestamps only feed display ordering.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return parsed.and_utc();
    }
    tracing::warn!("Unparseable backend timestamp: {}", raw);
    Utc::now()
}

impl HttpGateway {
    /// Creates a gateway for the configured backend
    ///
    /// # Arguments
    ///
    /// * `config` - API endpoint configuration
    /// * `token` - Bearer token attached to every request, when present
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use docent::config::ApiConfig;
    /// use docent::gateway::HttpGateway;
    ///
    /// let gateway = HttpGateway::new(&ApiConfig::default(), None);
    /// assert!(gateway.is_ok());
    /// ```
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("docent/0.1.0")
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized HTTP gateway: base_url={}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// The backend base URL this gateway talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchanges credentials for a bearer token via `POST /auth/login`
    ///
    /// The login endpoint takes an OAuth2 password form and needs no token,
    /// so this is an associated function rather than a trait operation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Server`] with status 401 on bad credentials
    /// and [`GatewayError::Network`] on transport failure.
    pub async fn login(
        config: &ApiConfig,
        username: &str,
        password: &str,
    ) -> Result<String, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("docent/0.1.0")
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let url = format!("{}/auth/login", config.base_url.trim_end_matches('/'));
        tracing::debug!("Logging in: {}", url);

        let response = client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to reach backend: {}", e)))?;

        let body: TokenBody = decode(check_status(response).await?).await?;
        Ok(body.access_token)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, GatewayError> {
        let url = format!("{}/chat/conversations", self.base_url);
        tracing::debug!("Listing conversations: {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Conversation listing failed: {}", e);
                GatewayError::Network(format!("Failed to reach backend: {}", e))
            })?;

        let rows: Vec<ConversationRow> = decode(check_status(response).await?).await?;
        Ok(rows
            .into_iter()
            .map(ConversationRow::into_conversation)
            .collect())
    }

    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<Message>, GatewayError> {
        let url = format!(
            "{}/chat/conversations/{}/messages",
            self.base_url, conversation_id
        );
        tracing::debug!("Fetching messages: {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Message fetch failed: {}", e);
                GatewayError::Network(format!("Failed to reach backend: {}", e))
            })?;

        let rows: Vec<MessageRow> = decode(check_status(response).await?).await?;
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    async fn send_message(
        &self,
        conversation_id: Option<i64>,
        text: &str,
    ) -> Result<SendReply, GatewayError> {
        let url = format!("{}/chat", self.base_url);
        tracing::debug!(conversation = ?conversation_id, "Sending message: {}", url);

        let body = SendRequest {
            content: text,
            conversation_id,
        };
        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Send failed: {}", e);
                GatewayError::Network(format!("Failed to reach backend: {}", e))
            })?;

        let reply: SendReplyBody = decode(check_status(response).await?).await?;

        let mut assistant = reply.message.into_message();
        if assistant.sources.is_empty() {
            // Older backends report sources only at the top level.
            if let Some(sources) = reply.sources {
                assistant.sources = sources;
            }
        }

        Ok(SendReply {
            conversation: reply.conversation.into_conversation(),
            message: assistant,
            user_message: reply.user_message.map(MessageRow::into_message),
        })
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), GatewayError> {
        let url = format!("{}/chat/conversations/{}", self.base_url, conversation_id);
        tracing::debug!("Deleting conversation: {}", url);

        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Deletion failed: {}", e);
                GatewayError::Network(format!("Failed to reach backend: {}", e))
            })?;

        let status = response.status().as_u16();
        let body: OkBody = decode(check_status(response).await?).await?;
        if !body.ok {
            return Err(GatewayError::Server {
                status,
                message: "deletion not acknowledged".to_string(),
            });
        }
        Ok(())
    }
}

/// Maps a non-success status to [`GatewayError::Server`]
async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    tracing::error!("Backend returned {}: {}", status, message);
    Err(GatewayError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Decodes a JSON reply body
async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    response
        .json()
        .await
        .map_err(|e| GatewayError::Network(format!("Failed to parse backend reply: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::MessageId;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let parsed = parse_timestamp("2024-03-01T10:30:00Z");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_database_format() {
        let parsed = parse_timestamp("2024-03-01 10:30:00");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_with_fraction() {
        let parsed = parse_timestamp("2024-03-01 10:30:00.250000");
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_conversation_row_decodes_null_title() {
        let json = r#"{"id":3,"title":null,"created_at":"2024-03-01T10:30:00Z","updated_at":"2024-03-01T10:31:00Z","message_count":4}"#;
        let row: ConversationRow = serde_json::from_str(json).unwrap();
        let conversation = row.into_conversation();
        assert_eq!(conversation.id, 3);
        assert_eq!(conversation.title, "(untitled)");
        assert_eq!(conversation.message_count, 4);
    }

    #[test]
    fn test_message_row_extracts_metadata_sources() {
        let json = r#"{
            "id": 43,
            "conversation_id": 7,
            "role": "assistant",
            "content": "Grounded answer",
            "metadata": {"sources": [{"type": "regulation", "title": "GDPR", "section": "32"}]},
            "created_at": "2024-03-01T10:30:00Z"
        }"#;
        let row: MessageRow = serde_json::from_str(json).unwrap();
        let message = row.into_message();
        assert_eq!(message.id, MessageId::Server(43));
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.sources.len(), 1);
        assert_eq!(message.sources[0].label(), "GDPR §32");
    }

    #[test]
    fn test_message_row_without_metadata() {
        let json = r#"{"id":42,"conversation_id":7,"role":"user","content":"Hello","created_at":"2024-03-01T10:30:00Z"}"#;
        let row: MessageRow = serde_json::from_str(json).unwrap();
        let message = row.into_message();
        assert_eq!(message.role, Role::User);
        assert!(message.sources.is_empty());
    }

    #[test]
    fn test_send_request_omits_absent_conversation() {
        let body = SendRequest {
            content: "Hello",
            conversation_id: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"content":"Hello"}"#);

        let body = SendRequest {
            content: "Hello",
            conversation_id: Some(7),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""conversation_id":7"#));
    }

    #[test]
    fn test_send_reply_body_decodes_without_optional_fields() {
        let json = r#"{
            "message": {"id":43,"conversation_id":7,"role":"assistant","content":"Hi","created_at":"2024-03-01T10:30:00Z"},
            "conversation": {"id":7,"title":"Hello","created_at":"2024-03-01T10:00:00Z","updated_at":"2024-03-01T10:30:00Z","message_count":2}
        }"#;
        let body: SendReplyBody = serde_json::from_str(json).unwrap();
        assert!(body.sources.is_none());
        assert!(body.user_message.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        };
        let gateway = HttpGateway::new(&config, None).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8000");
    }
}
