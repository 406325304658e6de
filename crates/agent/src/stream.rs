//! Streaming engine types: turn events, cancellation, and the consumer's
//! transcript view.
//!
//! The producer (the orchestration loop on its background task) emits
//! [`TurnEvent`]s into a FIFO channel. The consumer polls with a short
//! timeout, merges completed messages into its own [`TranscriptView`], and
//! owns the cooperative [`CancelSignal`]. The producer never exposes its
//! live transcript; only immutable message copies cross the channel.

use emberclaw_core::message::Message;
use emberclaw_core::session::Session;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events emitted by the producer during a turn, in emission order.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// Incremental text of the in-progress assistant reply.
    Fragment { text: String },

    /// A message reached its final form and entered the producer's
    /// transcript: an assistant reply (action announcement when its action
    /// list is non-empty) or a tool result.
    Completed { message: Message, turn: u32 },

    /// The turn aborted on a reasoning-service failure. Terminal.
    Failed { error: String },

    /// The turn ran to completion. Terminal.
    Finished { turn: u32 },
}

/// Cooperative stop signal shared between consumer and producer.
///
/// The producer observes it between node transitions, never preemptively
/// mid-tool-call; an in-flight tool invocation runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to one producer run: its event stream plus the join handle that
/// returns Session ownership when the producer finishes.
pub struct TurnHandle {
    pub events: mpsc::Receiver<TurnEvent>,
    pub handle: JoinHandle<Session>,
}

/// The consumer's private transcript copy.
///
/// Completed-message events are de-duplicated by message id before merging,
/// so replays or overlapping deliveries never double-append.
#[derive(Debug, Default)]
pub struct TranscriptView {
    messages: Vec<Message>,
    seen_ids: HashSet<String>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user's own message (never delivered via the channel).
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Merge a completed message. Returns false when it was already seen.
    pub fn merge(&mut self, message: Message) -> bool {
        if let Some(id) = message.id() {
            if !self.seen_ids.insert(id.to_string()) {
                return false;
            }
        }
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
