//! Shared types used across the agent runtime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Chat messages (model boundary)
// ---------------------------------------------------------------------------

/// A chat message handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool invocation
// ---------------------------------------------------------------------------

/// Opening marker of a tool-invocation block in raw model output.
pub const TOOL_CALL_OPEN: &str = "<tool_call>";

/// Closing marker of a tool-invocation block in raw model output.
pub const TOOL_CALL_CLOSE: &str = "</tool_call>";

/// A tool call extracted from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocationRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Render the request as a delimited block, the same shape the model emits.
    pub fn to_block(&self) -> String {
        let body = serde_json::json!({
            "name": self.name,
            "arguments": self.arguments,
        });
        format!("{}\n{}\n{}", TOOL_CALL_OPEN, body, TOOL_CALL_CLOSE)
    }
}

/// Classification of a failed tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    ToolNotFound,
    HandlerError,
    TransportFailure,
    ResolutionFailed,
    DataUnavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound => write!(f, "ToolNotFound"),
            Self::HandlerError => write!(f, "HandlerError"),
            Self::TransportFailure => write!(f, "TransportFailure"),
            Self::ResolutionFailed => write!(f, "ResolutionFailed"),
            Self::DataUnavailable => write!(f, "DataUnavailable"),
        }
    }
}

/// Outcome of dispatching one [`ToolInvocationRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    pub tool_name: String,
    pub success: bool,
    pub payload: Option<Value>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ToolInvocationResult {
    pub fn ok(tool_name: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            payload: Some(payload),
            error: None,
            failure: None,
        }
    }

    /// Build a failed result. The error text is prefixed with the kind name.
    pub fn failed(tool_name: impl Into<String>, kind: FailureKind, message: impl fmt::Display) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            payload: None,
            error: Some(format!("{}: {}", kind, message)),
            failure: Some(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation history
// ---------------------------------------------------------------------------

/// Content of a conversation turn: plain text or a structured record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Structured(Value),
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: TurnContent,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Assistant turn. Carries the tool calls as a structured record when present.
    pub fn assistant(content: &str, requests: &[ToolInvocationRequest]) -> Self {
        let content = if requests.is_empty() {
            TurnContent::Text(content.to_string())
        } else {
            TurnContent::Structured(serde_json::json!({
                "content": content,
                "tool_calls": requests,
            }))
        };
        Self {
            role: ChatRole::Assistant,
            content,
        }
    }

    pub fn tool(result: &ToolInvocationResult) -> Self {
        Self {
            role: ChatRole::Tool,
            content: TurnContent::Structured(
                serde_json::to_value(result).unwrap_or(Value::Null),
            ),
        }
    }
}
