//! Session state: the append-only transcript and the capability context.
//!
//! A `Session` is created per conversation. During a turn it is owned by
//! exactly one producer task; between turns it lives with the caller. No
//! locking anywhere: mutation is confined to a single writer at a time.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Append-only ordered sequence of messages. Insertion order is causal order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. There is deliberately no removal operation.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The active skills: skill name mapped to its instruction text.
///
/// Mutated only by the capability manager. Every entry is injected verbatim
/// into every reasoning call until deactivated. Iteration order is not
/// semantically meaningful; [`CapabilityContext::sorted`] exists so prompt
/// assembly stays deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityContext {
    skills: HashMap<String, String>,
}

impl CapabilityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store instruction text under a skill name. Re-activation replaces
    /// the previous instructions.
    pub fn activate(&mut self, name: impl Into<String>, instructions: impl Into<String>) {
        self.skills.insert(name.into(), instructions.into());
    }

    /// Remove a skill. Returns whether it was active.
    pub fn deactivate(&mut self, name: &str) -> bool {
        self.skills.remove(name).is_some()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    pub fn instructions(&self, name: &str) -> Option<&str> {
        self.skills.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Active skills sorted by name, for deterministic prompt assembly.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .skills
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }
}

/// The mutable record shared across a run: transcript plus capability context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub transcript: Transcript,
    pub capabilities: CapabilityContext,
}

impl Session {
    /// Create a fresh session: empty transcript, empty capability context.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_preserves_order() {
        let mut t = Transcript::new();
        t.push(Message::user("first"));
        t.push(Message::assistant("second", vec![]));
        t.push(Message::user("third"));

        let texts: Vec<&str> = t.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(t.last().unwrap().text(), "third");
    }

    #[test]
    fn activate_then_deactivate() {
        let mut ctx = CapabilityContext::new();
        ctx.activate("excel_master", "Use openpyxl for spreadsheets.");
        assert!(ctx.is_active("excel_master"));

        assert!(ctx.deactivate("excel_master"));
        assert!(!ctx.is_active("excel_master"));
        assert!(ctx.is_empty());

        // Deactivating again is a no-op, not an error
        assert!(!ctx.deactivate("excel_master"));
    }

    #[test]
    fn reactivation_reinstates_instructions() {
        let mut ctx = CapabilityContext::new();
        ctx.activate("ppt_master", "v1 instructions");
        ctx.deactivate("ppt_master");
        ctx.activate("ppt_master", "v2 instructions");

        assert_eq!(ctx.instructions("ppt_master"), Some("v2 instructions"));
    }

    #[test]
    fn sorted_is_deterministic() {
        let mut ctx = CapabilityContext::new();
        ctx.activate("zeta", "z");
        ctx.activate("alpha", "a");
        ctx.activate("mid", "m");

        let names: Vec<&str> = ctx.sorted().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert!(session.transcript.is_empty());
        assert!(session.capabilities.is_empty());
    }
}
