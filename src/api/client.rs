use super::error::ApiError;
use crate::types::{ChatMessage, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant. Respond in Korean.";
const NO_REPLY_FALLBACK: &str = "응답을 받을 수 없었습니다.";
const DEFAULT_BASE_URL: &str = "http://localhost:9000";
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One prior turn as the backend expects it: role and content only,
/// timestamps stay local.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for HistoryTurn {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    model: &'a str,
    system_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_history: Option<&'a [HistoryTurn]>,
}

#[derive(Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Roles as stored server-side. A `system` turn can appear in fetched
/// conversations but never enters the rendered transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Thin client for the chatbot service. Cheap to clone; the inner
/// `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct ChatApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ChatApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            token,
        }
    }

    /// Base URL from `CHAT_API_BASE_URL`, defaulting to the local chatbot
    /// service port.
    pub fn from_env(token: Option<String>) -> Self {
        let base_url =
            std::env::var("CHAT_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send one chat turn with the rolling history. Returns the reply text;
    /// the service never answers with an empty acceptance.
    pub async fn send_message(
        &self,
        message: &str,
        history: &[HistoryTurn],
        model: Option<&str>,
        system_message: Option<&str>,
    ) -> Result<String, ApiError> {
        let request = ChatRequest {
            message,
            model: model.unwrap_or(DEFAULT_MODEL),
            system_message: system_message.unwrap_or(DEFAULT_SYSTEM_MESSAGE),
            conversation_history: (!history.is_empty()).then_some(history),
        };

        let response = self
            .authorize(self.client.post(self.url("/chatbot/chat")))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.detail);
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).unwrap_or_default();
        Ok(reply_text(parsed.message, parsed.response))
    }

    /// Streaming send, reserved for future real-time delivery.
    pub async fn send_message_stream<F>(
        &self,
        _message: &str,
        _history: &[HistoryTurn],
        _on_chunk: F,
    ) -> Result<(), ApiError>
    where
        F: FnMut(&str),
    {
        Err(ApiError::StreamingUnavailable)
    }

    /// Liveness probe against the send endpoint. Any response, including an
    /// error status, means the service process is reachable; only
    /// refused-connection-class failures count as down. Never raises.
    pub async fn check_health(&self) -> bool {
        let result = self
            .authorize(self.client.get(self.url("/chatbot/chat")))
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(_) => true,
            Err(err) => !is_connectivity_failure(&err),
        }
    }

    /// Fetch one conversation's messages.
    pub async fn conversation(&self, id: &str) -> Result<Vec<WireMessage>, ApiError> {
        self.get_json(&format!("/api/chat/conversation/{id}")).await
    }

    /// List conversations.
    pub async fn conversations(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        self.get_json("/api/chat/conversations").await
    }

    /// Delete one conversation.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .authorize(
                self.client
                    .delete(self.url(&format!("/api/chat/conversation/{id}"))),
            )
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: None,
            });
        }
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: None,
            });
        }
        response.json().await.map_err(transport)
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

// Only refused/unreachable connections count as down. A probe timeout means
// something accepted the connection, so the service process is reachable.
fn is_connectivity_failure(err: &reqwest::Error) -> bool {
    err.is_connect()
}

/// `message` field first, then `response`, then the canned fallback.
fn reply_text(message: Option<String>, response: Option<String>) -> String {
    message
        .filter(|text| !text.is_empty())
        .or_else(|| response.filter(|text| !text.is_empty()))
        .unwrap_or_else(|| NO_REPLY_FALLBACK.to_string())
}
