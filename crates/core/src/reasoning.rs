//! ReasoningClient trait — the abstraction over the reasoning service.
//!
//! A ReasoningClient takes a wire message list and returns the next assistant
//! reply, either complete or as a stream of chunks. The message list always
//! begins with one synthesized context message (role description + memory
//! excerpt + capability catalog + active capability instructions) followed by
//! the transcript flattened into wire form.

use crate::error::ReasoningError;
use crate::message::{ActionRequest, Message};
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a wire message sent to the reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The synthesized leading context message
    System,
    /// The end user
    User,
    /// The reasoning service itself
    Assistant,
    /// A tool execution result
    Tool,
}

/// A message in reasoning-service wire form.
///
/// The transcript's typed variants are flattened into this shape at the
/// reasoning boundary; this conversion is also where any non-conversational
/// entry would be filtered out (the typed transcript admits only
/// conversational variants, so the conversion is total).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,

    /// Actions requested (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRequest>,

    /// Which action this responds to (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
            actions: Vec::new(),
            action_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            actions: Vec::new(),
            action_id: None,
        }
    }

    /// Flatten a transcript message into wire form.
    pub fn from_message(message: &Message) -> Self {
        match message {
            Message::User { text } => Self::user(text.clone()),
            Message::Assistant { text, actions, .. } => Self {
                role: ChatRole::Assistant,
                content: text.clone(),
                actions: actions.clone(),
                action_id: None,
            },
            Message::ToolResult { action_id, text, .. } => Self {
                role: ChatRole::Tool,
                content: text.clone(),
                actions: Vec::new(),
                action_id: Some(action_id.clone()),
            },
        }
    }
}

/// The assistant reply produced by one reasoning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRequest>,

    /// Id assigned by the service, if any. The orchestration loop mints a
    /// fresh one otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A single chunk of an in-progress assistant reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThinkChunk {
    /// Partial text delta
    #[serde(default)]
    pub text: Option<String>,

    /// Completed action requests (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRequest>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

/// The core ReasoningClient trait.
///
/// The orchestration loop calls `invoke_stream()` without knowing which
/// backend is configured. Implementations that cannot stream fall back to
/// the default single-chunk wrapper around `invoke()`.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openai_compat", "mock").
    fn name(&self) -> &str;

    /// Send the message list and get the complete next assistant reply.
    async fn invoke(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> std::result::Result<AssistantReply, ReasoningError>;

    /// Send the message list and get a stream of reply chunks.
    ///
    /// Default implementation calls `invoke()` and wraps the result as a
    /// single final chunk.
    async fn invoke_stream(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ThinkChunk, ReasoningError>>,
        ReasoningError,
    > {
        let reply = self.invoke(messages, tools).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(ThinkChunk {
                text: Some(reply.text),
                actions: reply.actions,
                done: true,
            }))
            .await;
        Ok(rx)
    }

    /// Release any underlying transport resources.
    ///
    /// Called exactly once at session teardown; implementations that hold
    /// nothing may keep the default no-op.
    async fn close(&self) -> std::result::Result<(), ReasoningError> {
        Ok(())
    }
}
