//! Router — the per-turn state machine.
//!
//! States: `Think` (initial), `CapabilityManage`, `ToolExec`, `Done`
//! (terminal). The transition function is evaluated on the latest assistant
//! reply's action list, after guardrail filtering. Capability-management
//! requests take absolute priority over co-requested tool calls.

use emberclaw_core::message::ActionRequest;
use emberclaw_core::tool::is_capability_tool;

/// The processing stages of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ask the reasoning service for the next step (initial state)
    Think,
    /// Execute capability activate/deactivate requests
    CapabilityManage,
    /// Execute ordinary tool requests
    ToolExec,
    /// The turn is complete (terminal state)
    Done,
}

/// Select the next stage from a filtered action list.
///
/// After `CapabilityManage` or `ToolExec` completes, control always returns
/// to `Think`; cancellation forces an external stop instead.
pub fn route(actions: &[ActionRequest]) -> Phase {
    if actions.is_empty() {
        return Phase::Done;
    }
    if actions.iter().any(|a| is_capability_tool(&a.tool_name)) {
        return Phase::CapabilityManage;
    }
    Phase::ToolExec
}
