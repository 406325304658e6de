//! In-memory skill registry for tests and embedding.

use crate::suggest::suggest;
use async_trait::async_trait;
use emberclaw_core::error::SkillError;
use emberclaw_core::skill::{SkillRegistry, SkillSummary};
use std::collections::BTreeMap;

/// A registry backed by a plain map. Insertion order is irrelevant; the
/// BTreeMap keeps catalogs deterministic.
#[derive(Default)]
pub struct InMemorySkillRegistry {
    skills: BTreeMap<String, (String, String)>,
}

impl InMemorySkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration: name, catalog description, instructions.
    pub fn with_skill(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        self.skills
            .insert(name.into(), (description.into(), instructions.into()));
        self
    }
}

#[async_trait]
impl SkillRegistry for InMemorySkillRegistry {
    async fn resolve(&self, name: &str) -> Result<String, SkillError> {
        match self.skills.get(name) {
            Some((_, instructions)) => Ok(instructions.clone()),
            None => Err(SkillError::NotFound {
                name: name.to_string(),
                suggestions: suggest(name, self.skills.keys().map(String::as_str)),
            }),
        }
    }

    async fn catalog(&self) -> Vec<SkillSummary> {
        self.skills
            .iter()
            .map(|(id, (description, _))| SkillSummary {
                id: id.clone(),
                description: description.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_and_catalog() {
        let registry = InMemorySkillRegistry::new()
            .with_skill("excel_master", "Spreadsheets", "Use openpyxl.")
            .with_skill("ppt_master", "Slides", "Use python-pptx.");

        assert_eq!(registry.resolve("excel_master").await.unwrap(), "Use openpyxl.");

        let catalog = registry.catalog().await;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].id, "excel_master");
    }

    #[tokio::test]
    async fn unknown_name_gets_suggestions() {
        let registry = InMemorySkillRegistry::new().with_skill("image_to_pdf", "PDF", "...");

        let err = registry.resolve("imagetopdf").await.unwrap_err();
        match err {
            SkillError::NotFound { suggestions, .. } => {
                assert_eq!(suggestions, vec!["image_to_pdf".to_string()]);
            }
            _ => panic!("Wrong variant"),
        }
    }
}
