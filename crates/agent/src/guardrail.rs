//! Guardrail filter — deterministic post-processing of assistant replies.
//!
//! Applied to every reply before it enters the transcript or is routed.
//! Two rules, both idempotent and order-independent:
//!
//! - **Capability exclusivity**: a capability change invalidates the context
//!   the other actions were decided under, so they are deferred.
//! - **Read before write**: a write co-requested with a read of a file would
//!   overwrite content the reasoning service has not observed yet.
//!
//! A rule firing is a silent correction, never an error.

use emberclaw_core::reasoning::AssistantReply;
use emberclaw_core::tool::is_capability_tool;
use tracing::debug;

/// Tool names the read-before-write rule watches.
const FILE_READ_TOOL: &str = "file_read";
const FILE_WRITE_TOOL: &str = "file_write";

/// Shown instead of the reply text when capability exclusivity fires.
pub const CAPABILITY_DEFERRAL_NOTICE: &str =
    "Confirming the capability change first; the other requested actions are deferred until the updated context is in effect.";

/// Shown instead of the reply text when read-before-write fires.
pub const READ_BEFORE_WRITE_NOTICE: &str =
    "Reading the file before overwriting it; the write is deferred until the current content has been observed.";

/// Placeholder when actions are requested with no visible text.
pub const INVOKING_TOOLS_PLACEHOLDER: &str = "Invoking tools.";

/// Apply both guardrail rules to a reply.
pub fn apply(reply: AssistantReply) -> AssistantReply {
    let reply = capability_exclusivity(reply);
    let reply = read_before_write(reply);
    ensure_visible_text(reply)
}

/// Rule A: a capability-management request alongside any other action drops
/// everything but the capability request(s).
fn capability_exclusivity(mut reply: AssistantReply) -> AssistantReply {
    let has_capability = reply
        .actions
        .iter()
        .any(|a| is_capability_tool(&a.tool_name));

    if !has_capability || reply.actions.len() <= 1 {
        return reply;
    }

    let before = reply.actions.len();
    reply
        .actions
        .retain(|a| is_capability_tool(&a.tool_name));
    debug!(
        dropped = before - reply.actions.len(),
        "Capability exclusivity: deferring co-requested actions"
    );
    reply.text = CAPABILITY_DEFERRAL_NOTICE.to_string();
    reply
}

/// Rule B: a file write co-requested with a file read drops every write.
fn read_before_write(mut reply: AssistantReply) -> AssistantReply {
    let has = |name: &str| reply.actions.iter().any(|a| a.tool_name == name);
    if !(has(FILE_READ_TOOL) && has(FILE_WRITE_TOOL)) {
        return reply;
    }

    let before = reply.actions.len();
    reply.actions.retain(|a| a.tool_name != FILE_WRITE_TOOL);
    debug!(
        dropped = before - reply.actions.len(),
        "Read-before-write: deferring file writes"
    );
    reply.text = READ_BEFORE_WRITE_NOTICE.to_string();
    reply
}

/// The transcript always carries a human-readable trace of intent.
fn ensure_visible_text(mut reply: AssistantReply) -> AssistantReply {
    if !reply.actions.is_empty() && reply.text.trim().is_empty() {
        reply.text = INVOKING_TOOLS_PLACEHOLDER.to_string();
    }
    reply
}
