//! Skill registry implementations.
//!
//! A skill is a named block of instruction text that, once activated, is
//! injected into every reasoning call until deactivated. This crate provides
//! the directory-backed registry used in production (one subdirectory per
//! skill, each containing a `SKILL.md`) and an in-memory registry for tests.

pub mod dir_registry;
pub mod in_memory;
mod suggest;

pub use dir_registry::DirSkillRegistry;
pub use in_memory::InMemorySkillRegistry;
pub use suggest::suggest;
