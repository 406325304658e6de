//! # Emberclaw Core
//!
//! Domain types, traits, and error definitions for the Emberclaw agent
//! control core. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here (reasoning service,
//! skill registry, tools, memory). Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod memory;
pub mod message;
pub mod reasoning;
pub mod session;
pub mod skill;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use memory::MemoryReader;
pub use message::{ActionRequest, Message};
pub use reasoning::{AssistantReply, ChatMessage, ChatRole, ReasoningClient, ThinkChunk};
pub use session::{CapabilityContext, Session, Transcript};
pub use skill::{SkillRegistry, SkillSummary};
pub use tool::{Tool, ToolDefinition, ToolOutput, ToolPayload, ToolRegistry};
