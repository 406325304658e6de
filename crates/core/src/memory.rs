//! Memory collaborator trait — read-only long-term memory access.
//!
//! The orchestration core only ever reads a bounded-length excerpt for
//! context assembly. Mutation happens out of band and is not part of this
//! interface.

use crate::error::MemoryError;
use async_trait::async_trait;

/// Read-only access to the agent's long-term memory.
#[async_trait]
pub trait MemoryReader: Send + Sync {
    /// The backend name (e.g., "file", "noop").
    fn name(&self) -> &str;

    /// Fetch an excerpt of at most `max_chars` characters.
    ///
    /// An empty string means "no memory available" and is not an error.
    async fn excerpt(&self, max_chars: usize) -> std::result::Result<String, MemoryError>;
}
