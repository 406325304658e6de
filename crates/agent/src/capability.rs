//! Capability manager — executes capability actions and mutates the context.
//!
//! The reserved tools return a typed payload; the manager switches on it
//! instead of matching sentinel substrings in result text. The transcript
//! only ever receives human-readable confirmation text, never the raw
//! instruction payload.

use emberclaw_core::message::{ActionRequest, Message};
use emberclaw_core::session::CapabilityContext;
use emberclaw_core::tool::{ToolPayload, ToolRegistry, is_capability_tool};
use std::sync::Arc;
use tracing::{info, warn};

pub struct CapabilityManager {
    tools: Arc<ToolRegistry>,
}

impl CapabilityManager {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Execute every capability action in the list, in order, mutating the
    /// capability context and producing one tool result per action.
    ///
    /// Non-capability actions are ignored here; the guardrail filter has
    /// already removed them when they were co-requested.
    pub async fn handle(
        &self,
        actions: &[ActionRequest],
        capabilities: &mut CapabilityContext,
    ) -> Vec<Message> {
        let mut results = Vec::new();

        for action in actions.iter().filter(|a| is_capability_tool(&a.tool_name)) {
            let text = match self.tools.execute(action).await {
                Ok(output) => match output.payload {
                    ToolPayload::CapabilityActivated { name, instructions } => {
                        capabilities.activate(&name, instructions);
                        info!(skill = %name, "Capability activated");
                        output.text
                    }
                    ToolPayload::CapabilityDeactivated { name } => {
                        if capabilities.deactivate(&name) {
                            info!(skill = %name, "Capability deactivated");
                            format!("Skill '{name}' deactivated.")
                        } else {
                            format!("Skill '{name}' was not active; nothing to change.")
                        }
                    }
                    // Plain text from a capability tool is a readable failure
                    // (unknown skill, unreadable definition)
                    ToolPayload::PlainText => output.text,
                },
                Err(e) => {
                    warn!(tool = %action.tool_name, error = %e, "Capability action failed");
                    format!("Error: {e}")
                }
            };

            results.push(Message::tool_result(&action.id, &action.tool_name, text));
        }

        results
    }
}
