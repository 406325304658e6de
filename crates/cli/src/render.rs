//! Terminal rendering for the chat consumer.
//!
//! Plain stdout/stderr, no styling framework. The status line is redrawn in
//! place with carriage returns while the consumer waits for events.

use emberclaw_core::message::{ActionRequest, Message};
use std::io::Write;
use std::time::Duration;

/// What the consumer is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Waiting for the reasoning service to start replying
    Awaiting,
    /// Assistant text is streaming in
    Streaming,
    /// One or more tools are executing
    ToolRunning,
}

/// Rotating status phrases shown while the reasoning service is thinking.
const STATUS_PHRASES: [&str; 6] = [
    "Thinking",
    "Consulting the model",
    "Connecting some dots",
    "Weighing the options",
    "Crunching context",
    "Almost there",
];

const STATUS_WIDTH: usize = 72;

/// Redraw the in-place status line.
pub fn status(mode: DisplayMode, elapsed: Duration, cancelling: bool) {
    let label = match mode {
        // Rotate through the phrases every few seconds
        DisplayMode::Awaiting => STATUS_PHRASES[(elapsed.as_secs() / 4) as usize % STATUS_PHRASES.len()],
        DisplayMode::Streaming => "Streaming reply",
        DisplayMode::ToolRunning => "Running tools",
    };
    let hint = if cancelling {
        "stopping..."
    } else {
        "Ctrl+C to cancel"
    };
    eprint!(
        "\r  {label}... ({:.1}s) [{hint}]{:pad$}",
        elapsed.as_secs_f64(),
        "",
        pad = 8
    );
    let _ = std::io::stderr().flush();
}

/// Erase the status line before printing real output.
pub fn clear_status() {
    eprint!("\r{:width$}\r", "", width = STATUS_WIDTH);
    let _ = std::io::stderr().flush();
}

/// Print one streamed fragment of assistant text.
pub fn fragment(text: &str, first: bool) {
    if first {
        print!("\n  Agent > ");
    }
    // Keep multi-line fragments aligned under the prefix
    print!("{}", text.replace('\n', "\n  "));
    let _ = std::io::stdout().flush();
}

/// Close the streamed-text line once the full reply has arrived.
pub fn end_fragments() {
    println!();
}

/// Print the action announcements of a completed assistant message.
pub fn actions(actions: &[ActionRequest]) {
    for action in actions {
        println!("  [action] {}", describe_action(action));
    }
}

/// Render a tool result, truncated to a handful of lines.
pub fn tool_result(message: &Message) {
    let Message::ToolResult { tool_name, text, .. } = message else {
        return;
    };

    println!("  [{tool_name}]");
    let lines: Vec<&str> = text.lines().collect();
    for line in lines.iter().take(10) {
        println!("  | {line}");
    }
    if lines.len() > 10 {
        println!("  | ... ({} lines total)", lines.len());
    }
}

/// Render a terminal turn failure.
pub fn error(text: &str) {
    eprintln!("\n  [error] {text}");
}

fn describe_action(action: &ActionRequest) -> String {
    // Shell commands read better as a command line than as JSON
    if action.tool_name == "shell" {
        if let Some(command) = action.arg_str("command") {
            return format!("shell $ {command}");
        }
    }
    let args = serde_json::Value::Object(action.arguments.clone());
    format!("{}({})", action.tool_name, args)
}
