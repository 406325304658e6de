//! No-op memory reader for sessions without long-term memory.

use async_trait::async_trait;
use emberclaw_core::error::MemoryError;
use emberclaw_core::memory::MemoryReader;

#[derive(Default)]
pub struct NoopMemory;

#[async_trait]
impl MemoryReader for NoopMemory {
    fn name(&self) -> &str {
        "noop"
    }

    async fn excerpt(&self, _max_chars: usize) -> Result<String, MemoryError> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_empty() {
        let memory = NoopMemory;
        assert_eq!(memory.name(), "noop");
        assert!(memory.excerpt(1000).await.unwrap().is_empty());
    }
}
