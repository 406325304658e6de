//! Message and action domain types.
//!
//! These are the core value objects that flow through the entire system:
//! user input enters the transcript, the reasoning service appends assistant
//! messages, and action executions append tool results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single action requested by an assistant message.
///
/// Invariant: action ids are unique within a turn, and every tool result's
/// `action_id` refers to exactly one earlier `ActionRequest.id` in that turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Unique id for this action within its turn
    pub id: String,

    /// Name of the tool to invoke
    pub tool_name: String,

    /// Arguments as a JSON object
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ActionRequest {
    /// Create an action request with a freshly minted id.
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Look up a string argument by key.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// A single message in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Text typed by the user.
    User { text: String },

    /// A reasoning-service reply, possibly carrying action requests.
    Assistant {
        id: String,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        actions: Vec<ActionRequest>,
    },

    /// The outcome of executing one requested action.
    ToolResult {
        id: String,
        action_id: String,
        tool_name: String,
        text: String,
    },
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    /// Create a new assistant message with a freshly minted id.
    pub fn assistant(text: impl Into<String>, actions: Vec<ActionRequest>) -> Self {
        Self::Assistant {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            actions,
        }
    }

    /// Create a tool result message for the given action.
    pub fn tool_result(
        action_id: impl Into<String>,
        tool_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            id: Uuid::new_v4().to_string(),
            action_id: action_id.into(),
            tool_name: tool_name.into(),
            text: text.into(),
        }
    }

    /// The message id, if this variant carries one.
    ///
    /// User messages are never streamed, so they carry no id; the streaming
    /// consumer de-duplicates only assistant and tool-result messages.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::User { .. } => None,
            Self::Assistant { id, .. } | Self::ToolResult { id, .. } => Some(id),
        }
    }

    /// The visible text of this message.
    pub fn text(&self) -> &str {
        match self {
            Self::User { text }
            | Self::Assistant { text, .. }
            | Self::ToolResult { text, .. } => text,
        }
    }

    /// The actions requested by this message (empty for non-assistant variants).
    pub fn actions(&self) -> &[ActionRequest] {
        match self {
            Self::Assistant { actions, .. } => actions,
            _ => &[],
        }
    }
}
