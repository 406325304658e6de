//! SkillRegistry trait — resolves skill names to instruction text.
//!
//! The concrete resolution mechanism (scanning directories, parsing metadata)
//! lives behind this interface; the core only depends on resolve/catalog.

use crate::error::SkillError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One catalog entry describing a capability available for activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSummary {
    /// The skill name used with `activate_skill`
    pub id: String,

    /// A short human-readable description
    pub description: String,
}

/// The Capability Registry.
///
/// Implementations: directory-backed (one `SKILL.md` per skill directory),
/// in-memory (for tests).
#[async_trait]
pub trait SkillRegistry: Send + Sync {
    /// Resolve a skill name to its instruction text.
    ///
    /// Unknown names yield [`SkillError::NotFound`] carrying a bounded list
    /// of near-match suggestions.
    async fn resolve(&self, name: &str) -> std::result::Result<String, SkillError>;

    /// List the capabilities available for activation.
    async fn catalog(&self) -> Vec<SkillSummary>;
}
