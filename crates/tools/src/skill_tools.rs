//! The reserved capability-management tools.
//!
//! These are the only tools whose results carry a non-plain payload: the
//! capability manager switches on [`ToolPayload`] to mutate the capability
//! context. An unknown skill is not a tool error; it becomes readable result
//! text with near-match suggestions so the reasoning service can recover.

use async_trait::async_trait;
use emberclaw_core::error::{SkillError, ToolError};
use emberclaw_core::skill::SkillRegistry;
use emberclaw_core::tool::{ACTIVATE_SKILL, DEACTIVATE_SKILL, Tool, ToolOutput, ToolPayload};
use std::sync::Arc;
use tracing::info;

/// Resolve a skill through the registry and hand its instructions to the
/// capability manager.
pub struct ActivateSkillTool {
    registry: Arc<dyn SkillRegistry>,
}

impl ActivateSkillTool {
    pub fn new(registry: Arc<dyn SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for ActivateSkillTool {
    fn name(&self) -> &str {
        ACTIVATE_SKILL
    }

    fn description(&self) -> &str {
        "Activate a skill by name. Its instructions stay available for the rest of the session."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "The name of the skill to activate, e.g. 'image_to_pdf'"
                }
            },
            "required": ["skill_name"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        let name = arguments
            .get("skill_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'skill_name' argument".into()))?;

        match self.registry.resolve(name).await {
            Ok(instructions) => {
                info!(skill = %name, "Skill resolved for activation");
                Ok(ToolOutput {
                    payload: ToolPayload::CapabilityActivated {
                        name: name.to_string(),
                        instructions,
                    },
                    text: format!("Skill '{name}' activated."),
                })
            }
            Err(SkillError::NotFound { suggestions, .. }) => {
                let mut text = format!("Error: skill '{name}' is not installed.");
                if !suggestions.is_empty() {
                    text.push_str(&format!(" Did you mean: {}?", suggestions.join(", ")));
                }
                Ok(ToolOutput::plain(text))
            }
            Err(SkillError::Unreadable { reason, .. }) => Ok(ToolOutput::plain(format!(
                "Error: skill '{name}' could not be loaded: {reason}"
            ))),
        }
    }
}

/// Signal removal of a skill from the capability context.
pub struct DeactivateSkillTool;

#[async_trait]
impl Tool for DeactivateSkillTool {
    fn name(&self) -> &str {
        DEACTIVATE_SKILL
    }

    fn description(&self) -> &str {
        "Deactivate a previously activated skill, removing its instructions from the session."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "The name of the skill to deactivate"
                }
            },
            "required": ["skill_name"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        let name = arguments
            .get("skill_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'skill_name' argument".into()))?;

        Ok(ToolOutput {
            payload: ToolPayload::CapabilityDeactivated {
                name: name.to_string(),
            },
            text: format!("Skill '{name}' deactivated."),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberclaw_core::skill::SkillSummary;
    use std::collections::BTreeMap;

    /// Minimal registry stub so tool tests stay independent of the
    /// skills crate.
    struct StubRegistry {
        skills: BTreeMap<String, String>,
        suggestions: Vec<String>,
    }

    #[async_trait]
    impl SkillRegistry for StubRegistry {
        async fn resolve(&self, name: &str) -> Result<String, SkillError> {
            self.skills.get(name).cloned().ok_or_else(|| SkillError::NotFound {
                name: name.to_string(),
                suggestions: self.suggestions.clone(),
            })
        }

        async fn catalog(&self) -> Vec<SkillSummary> {
            self.skills
                .keys()
                .map(|id| SkillSummary {
                    id: id.clone(),
                    description: String::new(),
                })
                .collect()
        }
    }

    fn registry() -> Arc<StubRegistry> {
        Arc::new(StubRegistry {
            skills: [(
                "image_to_pdf".to_string(),
                "Use img2pdf to merge images.".to_string(),
            )]
            .into_iter()
            .collect(),
            suggestions: vec!["image_to_pdf".into()],
        })
    }

    fn args(name: &str) -> serde_json::Map<String, serde_json::Value> {
        serde_json::json!({"skill_name": name})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn activation_carries_instructions_in_payload() {
        let tool = ActivateSkillTool::new(registry());
        let output = tool.execute(args("image_to_pdf")).await.unwrap();

        match output.payload {
            ToolPayload::CapabilityActivated { name, instructions } => {
                assert_eq!(name, "image_to_pdf");
                assert!(instructions.contains("img2pdf"));
            }
            _ => panic!("Wrong payload"),
        }
        // Display text confirms without leaking the raw instructions
        assert_eq!(output.text, "Skill 'image_to_pdf' activated.");
        assert!(!output.text.contains("img2pdf"));
    }

    #[tokio::test]
    async fn unknown_skill_becomes_text_with_suggestions() {
        let tool = ActivateSkillTool::new(registry());
        let output = tool.execute(args("imagetopdf")).await.unwrap();

        assert!(matches!(output.payload, ToolPayload::PlainText));
        assert!(output.text.contains("imagetopdf"));
        assert!(output.text.contains("image_to_pdf"));
    }

    #[tokio::test]
    async fn deactivate_emits_typed_payload() {
        let tool = DeactivateSkillTool;
        let output = tool.execute(args("image_to_pdf")).await.unwrap();

        match output.payload {
            ToolPayload::CapabilityDeactivated { name } => assert_eq!(name, "image_to_pdf"),
            _ => panic!("Wrong payload"),
        }
    }

    #[tokio::test]
    async fn missing_skill_name_is_invalid() {
        let tool = ActivateSkillTool::new(registry());
        assert!(tool.execute(serde_json::Map::new()).await.is_err());

        let tool = DeactivateSkillTool;
        assert!(tool.execute(serde_json::Map::new()).await.is_err());
    }
}
