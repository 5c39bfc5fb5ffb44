use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{CompletionClient, CompletionError};
use crate::conversation::ChatMessage;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[allow(dead_code)]
    role: String,
    content: String,
}

/// Both the success body and the error body; which fields are present
/// decides how the reply is interpreted.
#[derive(Deserialize)]
struct ChatReply {
    message: Option<ReplyMessage>,
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Client for the backend's `POST /api/chat` endpoint
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for HttpClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let url = self.chat_url();
        debug!(%url, messages = messages.len(), "posting chat request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&ChatRequest { messages })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::network(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    CompletionError::network(format!("connection failed: {e}"))
                } else {
                    CompletionError::network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ChatReply>(&body)
                .ok()
                .and_then(|reply| reply.detail)
                .and_then(|detail| detail.as_str().map(str::to_string));
            warn!(status = status.as_u16(), ?detail, "chat request rejected");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        parse_reply(&body)
    }
}

/// Interpret a 2xx body.
fn parse_reply(body: &str) -> Result<String, CompletionError> {
    let reply: ChatReply = serde_json::from_str(body)
        .map_err(|e| CompletionError::malformed(format!("{e}")))?;

    if let Some(message) = reply.message {
        return Ok(message.content);
    }

    if let Some(text) = reply.detail.as_ref().and_then(error_text) {
        return Err(CompletionError::Application(text));
    }
    if let Some(error) = reply.error.as_ref() {
        let text = error_text(error).unwrap_or_else(|| "unknown error".to_string());
        return Err(CompletionError::Application(text));
    }

    Err(CompletionError::malformed("response has no `message` field"))
}

/// Pull a human-readable string out of `"text"` or `{"message": "text"}`.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
