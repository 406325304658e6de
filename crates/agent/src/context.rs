//! Context assembly for the reasoning step.
//!
//! Every reasoning call begins with one synthesized system message built
//! from four sections: the static role description, a bounded long-term
//! memory excerpt, the catalog of skills available for activation, and the
//! instruction text of every active skill tagged by name. The transcript
//! follows, flattened to wire form.
//!
//! Assembly is deterministic: active skills are injected sorted by name.

use emberclaw_core::memory::MemoryReader;
use emberclaw_core::reasoning::ChatMessage;
use emberclaw_core::session::Session;
use emberclaw_core::skill::SkillRegistry;
use std::sync::Arc;
use tracing::warn;

/// The fallback role description when none is configured.
pub const DEFAULT_ROLE_TEXT: &str = concat!(
    "You are a capable CLI agent with access to shell commands and file tools. ",
    "If a request is complex, check whether one of the available skills should ",
    "be activated first. Be concise, accurate, and proactive.",
);

pub struct ContextBuilder {
    role_text: String,
    memory: Arc<dyn MemoryReader>,
    skills: Arc<dyn SkillRegistry>,
    excerpt_chars: usize,
}

impl ContextBuilder {
    pub fn new(
        memory: Arc<dyn MemoryReader>,
        skills: Arc<dyn SkillRegistry>,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            role_text: DEFAULT_ROLE_TEXT.to_string(),
            memory,
            skills,
            excerpt_chars,
        }
    }

    /// Override the static role description.
    pub fn with_role_text(mut self, role_text: impl Into<String>) -> Self {
        self.role_text = role_text.into();
        self
    }

    /// Assemble the full wire message list for one reasoning call.
    pub async fn build(&self, session: &Session) -> Vec<ChatMessage> {
        let mut system = self.role_text.clone();

        // Long-term memory (read-only; failure must not abort the turn)
        match self.memory.excerpt(self.excerpt_chars).await {
            Ok(excerpt) if !excerpt.is_empty() => {
                system.push_str("\n\n## Long-Term Memory\n");
                system.push_str(&excerpt);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Memory excerpt failed, continuing without it"),
        }

        // Catalog of skills available for activation
        let catalog = self.skills.catalog().await;
        if !catalog.is_empty() {
            system.push_str("\n\n## Available Skills\n");
            for skill in &catalog {
                system.push_str(&format!("- {}: {}\n", skill.id, skill.description));
            }
        }

        // Active skill instructions, verbatim, tagged by name
        if !session.capabilities.is_empty() {
            system.push_str("\n\n## Active Skills\n");
            for (name, instructions) in session.capabilities.sorted() {
                system.push_str(&format!(
                    "\n<skill name=\"{name}\">\n{instructions}\n</skill>\n"
                ));
            }
        }

        let mut messages = Vec::with_capacity(session.transcript.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(session.transcript.iter().map(ChatMessage::from_message));
        messages
    }
}
