use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod controller;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation. Immutable once appended; the timeline is
/// append-only until a wholesale clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// A tool invocation the remote assistant made while producing a response.
/// `arguments` has no fixed schema; it is rendered verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelId {
    #[default]
    Gemini15Pro,
    Gemini15Flash,
    GeminiPro,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [
        ModelId::Gemini15Pro,
        ModelId::Gemini15Flash,
        ModelId::GeminiPro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Gemini15Pro => "gemini-1.5-pro",
            ModelId::Gemini15Flash => "gemini-1.5-flash",
            ModelId::GeminiPro => "gemini-pro",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelId::Gemini15Pro => "Gemini 1.5 Pro",
            ModelId::Gemini15Flash => "Gemini 1.5 Flash",
            ModelId::GeminiPro => "Gemini Pro",
        }
    }
}

/// Inference parameters for the session. Mutated only by explicit user
/// selection; the controller reads them when building a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub model: ModelId,
    pub temperature: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}
