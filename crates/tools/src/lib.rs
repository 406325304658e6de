//! Built-in tool implementations for Emberclaw.
//!
//! Ordinary tools give the agent the ability to act in the world: run shell
//! commands, read/write files, query the knowledge base. The two reserved
//! capability tools (`activate_skill`, `deactivate_skill`) mutate the
//! capability context instead; they are registered here but executed through
//! the capability manager.

pub mod file_read;
pub mod file_write;
pub mod knowledge_query;
pub mod paths;
pub mod shell;
pub mod skill_tools;

use emberclaw_core::skill::SkillRegistry;
use emberclaw_core::tool::ToolRegistry;
use std::sync::Arc;

pub use knowledge_query::{InMemoryKnowledgeBase, KnowledgeBase, KnowledgeHit};
pub use skill_tools::{ActivateSkillTool, DeactivateSkillTool};

/// Create a tool registry with all built-in tools.
///
/// Security defaults:
/// - Shell: only commands from the allowlist (empty = all allowed)
/// - File read/write: forbidden path prefixes are blocked
pub fn standard_registry(
    skills: Arc<dyn SkillRegistry>,
    allowed_commands: Vec<String>,
    allowed_roots: Vec<String>,
    forbidden_paths: Vec<String>,
    shell_timeout_secs: u64,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::ShellTool::new(
        allowed_commands,
        shell_timeout_secs,
    )));
    registry.register(Box::new(file_read::FileReadTool::with_restrictions(
        allowed_roots.clone(),
        forbidden_paths.clone(),
    )));
    registry.register(Box::new(file_write::FileWriteTool::with_restrictions(
        allowed_roots,
        forbidden_paths,
    )));
    registry.register(Box::new(knowledge_query::KnowledgeQueryTool::new(
        Arc::new(InMemoryKnowledgeBase::default()),
    )));
    registry.register(Box::new(ActivateSkillTool::new(skills)));
    registry.register(Box::new(DeactivateSkillTool));
    registry
}
