//! Directory-backed skill registry.
//!
//! Layout: `<root>/<skill_name>/SKILL.md`. The file's full content is the
//! instruction text. The catalog description comes from a `description:`
//! front-matter line when present, otherwise the first non-heading line.

use crate::suggest::suggest;
use async_trait::async_trait;
use emberclaw_core::error::SkillError;
use emberclaw_core::skill::{SkillRegistry, SkillSummary};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Well-known skill definition file name.
pub const SKILL_FILE: &str = "SKILL.md";

/// Longest catalog description before truncation.
const MAX_DESCRIPTION_CHARS: usize = 120;

/// Resolves skills from a directory tree on disk.
pub struct DirSkillRegistry {
    root: PathBuf,
}

impl DirSkillRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Installed skill names, sorted for deterministic catalogs.
    fn installed(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().join(SKILL_FILE).is_file())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        names.sort();
        names
    }

    fn skill_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(SKILL_FILE)
    }
}

#[async_trait]
impl SkillRegistry for DirSkillRegistry {
    async fn resolve(&self, name: &str) -> Result<String, SkillError> {
        // Reject path-shaped names before touching the filesystem
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(SkillError::NotFound {
                name: name.to_string(),
                suggestions: Vec::new(),
            });
        }

        let path = self.skill_path(name);
        if !path.is_file() {
            let installed = self.installed();
            let suggestions = suggest(name, installed.iter().map(String::as_str));
            debug!(skill = %name, ?suggestions, "Skill not installed");
            return Err(SkillError::NotFound {
                name: name.to_string(),
                suggestions,
            });
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!(skill = %name, path = %path.display(), error = %e, "Failed to read skill file");
                Err(SkillError::Unreadable {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn catalog(&self) -> Vec<SkillSummary> {
        self.installed()
            .into_iter()
            .map(|name| {
                let description = std::fs::read_to_string(self.skill_path(&name))
                    .map(|content| extract_description(&content))
                    .unwrap_or_default();
                SkillSummary { id: name, description }
            })
            .collect()
    }
}

/// Pull a one-line description out of a SKILL.md body.
fn extract_description(content: &str) -> String {
    let described = content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("description:").map(str::trim))
        .or_else(|| {
            content
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty() && !line.starts_with('#') && *line != "---")
        })
        .unwrap_or("");

    if described.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = described.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{truncated}...")
    } else {
        described.to_string()
    }
}
