//! HTTP client for the remote financial-assistant service.
//!
//! Stateless request/response mappings only: the chat endpoint and the CSV
//! ingestion endpoint. All session state lives in the controller.

use crate::session::{ModelId, Turn};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The service responded with a failure status. Carries the body's
    /// `detail` string when one was provided, else an `HTTP <status>` note.
    #[error("{0}")]
    Rejected(String),
    /// No response was obtained at all.
    #[error("network error: {0}")]
    Unreachable(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl TransportError {
    /// The message shown for a failed chat turn: remote detail, else the
    /// transport-level message, else the caller's generic fallback.
    pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        let message = match self {
            TransportError::Rejected(detail) => detail,
            TransportError::Unreachable(message) | TransportError::Parse(message) => message,
        };
        if message.is_empty() {
            fallback
        } else {
            message
        }
    }

    /// Upload errors surface only the remote detail or the fallback; the
    /// transport-level text stays in the logs.
    pub fn detail(&self) -> Option<&str> {
        match self {
            TransportError::Rejected(detail) if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub tool_calls: Vec<crate::session::ToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSummary {
    pub message: String,
    pub data_summary: DataSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSummary {
    pub columns: Vec<String>,
    pub row_count: u64,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Send the conversation so far and wait for the assistant's reply.
    /// Only role and content go on the wire; tool calls are never re-sent.
    pub async fn send_chat_turn(
        &self,
        history: &[Turn],
        model: ModelId,
        temperature: f32,
    ) -> Result<ChatReply, TransportError> {
        let body = build_chat_body(history, model, temperature);
        debug!(model = model.as_str(), turns = history.len(), "chat request");

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(rejection(status, &text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        parse_chat_reply(&json)
    }

    /// Upload a CSV dataset as a multipart form and wait for the ingestion
    /// confirmation.
    pub async fn upload_dataset(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadSummary, TransportError> {
        debug!(filename, size = bytes.len(), "dataset upload");

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .map_err(|e| TransportError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", file_part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(rejection(status, &text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        serde_json::from_value(json).map_err(|e| TransportError::Parse(e.to_string()))
    }
}

/// Build the JSON request body for the chat endpoint. The temperature is
/// kept at its one-decimal control precision on the wire.
fn build_chat_body(history: &[Turn], model: ModelId, temperature: f32) -> Value {
    let messages: Vec<Value> = history
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role,
                "content": turn.content,
            })
        })
        .collect();

    json!({
        "messages": messages,
        "model": model.as_str(),
        "temperature": (f64::from(temperature) * 10.0).round() / 10.0,
    })
}

/// Parse a chat reply. `tool_calls` may be absent or null.
fn parse_chat_reply(json: &Value) -> Result<ChatReply, TransportError> {
    let content = json["response"]
        .as_str()
        .ok_or_else(|| TransportError::Parse("no 'response' field in reply".to_string()))?
        .to_string();

    let tool_calls = match json.get("tool_calls") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| crate::session::ToolCall {
                name: item["name"].as_str().unwrap_or("").to_string(),
                arguments: item.get("arguments").filter(|v| !v.is_null()).cloned(),
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(ChatReply {
        content,
        tool_calls,
    })
}

/// Map a failure status to a TransportError, preferring the body's `detail`.
fn rejection(status: reqwest::StatusCode, body: &str) -> TransportError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["detail"].as_str().map(String::from))
        .filter(|d| !d.is_empty());

    TransportError::Rejected(detail.unwrap_or_else(|| format!("HTTP {status}")))
}
