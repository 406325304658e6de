//! File-backed memory reader.
//!
//! Reads a single markdown file (e.g. `~/.emberclaw/MEMORY.md`) and returns
//! the leading excerpt. A missing file is treated as empty memory, not an
//! error, so fresh installations work without setup.

use async_trait::async_trait;
use emberclaw_core::error::MemoryError;
use emberclaw_core::memory::MemoryReader;
use std::path::PathBuf;
use tracing::debug;

pub struct FileMemory {
    path: PathBuf,
}

impl FileMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MemoryReader for FileMemory {
    fn name(&self) -> &str {
        "file"
    }

    async fn excerpt(&self, max_chars: usize) -> Result<String, MemoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No memory file, returning empty excerpt");
                return Ok(String::new());
            }
            Err(e) => return Err(MemoryError::Storage(e.to_string())),
        };

        Ok(truncate_chars(&content, max_chars))
    }
}

/// Truncate on a char boundary, appending a marker when content was cut.
fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_chars).collect();
    format!("{truncated}\n...(truncated)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn reads_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MEMORY.md");
        fs::write(&path, "The user prefers metric units.").unwrap();

        let memory = FileMemory::new(&path);
        let excerpt = memory.excerpt(1000).await.unwrap();
        assert_eq!(excerpt, "The user prefers metric units.");
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let memory = FileMemory::new("/nonexistent/emberclaw/MEMORY.md");
        let excerpt = memory.excerpt(1000).await.unwrap();
        assert!(excerpt.is_empty());
    }

    #[tokio::test]
    async fn excerpt_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MEMORY.md");
        fs::write(&path, "x".repeat(5000)).unwrap();

        let memory = FileMemory::new(&path);
        let excerpt = memory.excerpt(100).await.unwrap();
        assert!(excerpt.starts_with(&"x".repeat(100)));
        assert!(excerpt.ends_with("...(truncated)"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Multi-byte chars must not be split
        let content = "héllo wörld".repeat(50);
        let excerpt = truncate_chars(&content, 10);
        assert!(excerpt.starts_with("héllo wörl"));
    }
}
