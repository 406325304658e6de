//! The core orchestration loop — the heart of Emberclaw.
//!
//! Each turn follows a **Think → Route → Act** cycle:
//!
//! 1. **Think**: assemble context and stream the next assistant reply
//! 2. **Guard**: apply the guardrail filter before the reply enters state
//! 3. **Route**: no actions → done; capability actions → capability manager;
//!    anything else → action executor
//! 4. Loop back to Think until the reply carries no actions, the iteration
//!    cap is hit, or cancellation is observed
//!
//! The loop runs on a background task (the producer) and emits events
//! through a FIFO channel to a foreground consumer that renders them and
//! owns cancellation.

pub mod capability;
pub mod context;
pub mod executor;
pub mod guardrail;
pub mod loop_runner;
pub mod router;
pub mod stream;

pub use capability::CapabilityManager;
pub use context::ContextBuilder;
pub use executor::ActionExecutor;
pub use loop_runner::AgentLoop;
pub use router::Phase;
pub use stream::{CancelSignal, TranscriptView, TurnEvent, TurnHandle};
