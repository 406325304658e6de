//! Tool trait — the abstraction over agent actions.
//!
//! Tools are what give the agent the ability to act in the world: execute
//! shell commands, read/write files, query the knowledge base. Two reserved
//! tool names mutate the capability context instead of acting externally;
//! they signal that through the typed [`ToolPayload`] envelope rather than
//! sentinel strings embedded in result text.

use crate::error::ToolError;
use crate::message::ActionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved tool name: activate a skill into the capability context.
pub const ACTIVATE_SKILL: &str = "activate_skill";

/// Reserved tool name: remove a skill from the capability context.
pub const DEACTIVATE_SKILL: &str = "deactivate_skill";

/// Whether a tool name is routed to the capability manager instead of the
/// action executor.
pub fn is_capability_tool(name: &str) -> bool {
    name == ACTIVATE_SKILL || name == DEACTIVATE_SKILL
}

/// What a tool execution produced, beyond its display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolPayload {
    /// An ordinary textual result.
    PlainText,

    /// A skill was resolved; its instructions belong in the capability context.
    CapabilityActivated { name: String, instructions: String },

    /// A skill should be removed from the capability context.
    CapabilityDeactivated { name: String },
}

/// The result of a tool execution: a typed payload plus display text.
///
/// The `text` is what enters the transcript; activation payloads never do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub payload: ToolPayload,
    pub text: String,
}

impl ToolOutput {
    /// An ordinary textual result.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            payload: ToolPayload::PlainText,
            text: text.into(),
        }
    }
}

/// A tool definition sent to the reasoning service so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each tool (shell, file_read, file_write, knowledge_query, the reserved
/// skill tools) implements this trait. Tools are registered in the
/// ToolRegistry and made available to the orchestration loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the reasoning service).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for the reasoning service.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The orchestration loop uses this to:
/// 1. Get tool definitions to send to the reasoning service
/// 2. Look up and execute tools when actions are requested
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for the reasoning service).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a requested action.
    pub async fn execute(
        &self,
        action: &ActionRequest,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(&action.tool_name)
            .ok_or_else(|| ToolError::NotFound(action.tool_name.clone()))?;
        tracing::debug!(tool = %action.tool_name, action_id = %action.id, "Dispatching tool call");
        tool.execute(action.arguments.clone()).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
