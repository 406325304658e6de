//! Action executor — runs ordinary (non-capability) tool requests.
//!
//! Every tool failure is caught here and converted into readable tool-result
//! text; a single failing tool never aborts the turn.

use emberclaw_core::message::{ActionRequest, Message};
use emberclaw_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ActionExecutor {
    tools: Arc<ToolRegistry>,
}

impl ActionExecutor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Execute one action and produce its tool result message.
    pub async fn execute(&self, action: &ActionRequest) -> Message {
        debug!(tool = %action.tool_name, action_id = %action.id, "Executing action");

        let start = std::time::Instant::now();
        let result = self.tools.execute(action).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                debug!(tool = %action.tool_name, duration_ms, "Action completed");
                Message::tool_result(&action.id, &action.tool_name, output.text)
            }
            Err(e) => {
                warn!(tool = %action.tool_name, duration_ms, error = %e, "Action failed");
                Message::tool_result(&action.id, &action.tool_name, format!("Error: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use emberclaw_core::error::ToolError;
    use emberclaw_core::tool::{Tool, ToolOutput};

    struct OkTool;

    #[async_trait]
    impl Tool for OkTool {
        fn name(&self) -> &str { "ok_tool" }
        fn description(&self) -> &str { "Always succeeds" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Map<String, serde_json::Value>,
        ) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::plain("all good"))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str { "failing_tool" }
        fn description(&self) -> &str { "Always fails" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Map<String, serde_json::Value>,
        ) -> Result<ToolOutput, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "failing_tool".into(),
                reason: "disk on fire".into(),
            })
        }
    }

    fn executor() -> ActionExecutor {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(OkTool));
        tools.register(Box::new(FailingTool));
        ActionExecutor::new(Arc::new(tools))
    }

    fn action(tool_name: &str) -> ActionRequest {
        ActionRequest::new(tool_name, serde_json::Map::new())
    }

    #[tokio::test]
    async fn success_produces_result_with_matching_action_id() {
        let request = action("ok_tool");
        let result = executor().execute(&request).await;

        match result {
            Message::ToolResult { action_id, tool_name, text, .. } => {
                assert_eq!(action_id, request.id);
                assert_eq!(tool_name, "ok_tool");
                assert_eq!(text, "all good");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[tokio::test]
    async fn failure_becomes_readable_text() {
        let result = executor().execute(&action("failing_tool")).await;
        assert!(result.text().starts_with("Error:"));
        assert!(result.text().contains("disk on fire"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_readable_text() {
        let result = executor().execute(&action("no_such_tool")).await;
        assert!(result.text().contains("Tool not found"));
    }
}
