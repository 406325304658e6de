//! Shell tool — execute system commands.
//!
//! Supports command allowlisting, a hard timeout, and output truncation so
//! one chatty command cannot flood the transcript.

use async_trait::async_trait;
use emberclaw_core::error::ToolError;
use emberclaw_core::tool::{Tool, ToolOutput};
use tokio::process::Command;
use tracing::{debug, warn};

/// Longest tool output before truncation, in characters.
const MAX_OUTPUT_CHARS: usize = 2000;

/// Execute shell commands with safety constraints.
pub struct ShellTool {
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,

    /// Hard wall-clock limit per command.
    timeout_secs: u64,
}

impl ShellTool {
    pub fn new(allowed_commands: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            allowed_commands,
            timeout_secs,
        }
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true; // No allowlist = all commands allowed
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("").trim();
        self.allowed_commands.iter().any(|a| a == base_cmd)
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str { "shell" }

    fn description(&self) -> &str {
        "Execute a shell command and return stdout/stderr. Use this for running programs, checking files, git operations, etc."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolOutput, ToolError> {
        let command = arguments
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        if !self.is_command_allowed(command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "shell".into(),
                reason: format!(
                    "Command '{}' not in allowlist",
                    command.split_whitespace().next().unwrap_or("")
                ),
            });
        }

        debug!(command = %command, "Executing shell command");

        let run = async {
            if cfg!(target_os = "windows") {
                Command::new("cmd").args(["/C", command]).output().await
            } else {
                Command::new("sh").args(["-c", command]).output().await
            }
        };

        let output = match tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            run,
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(command = %command, timeout_secs = self.timeout_secs, "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: "shell".into(),
                    timeout_secs: self.timeout_secs,
                });
            }
        };

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                let mut result_text = stdout;
                if !stderr.is_empty() {
                    result_text.push_str(&format!("\n[stderr]: {stderr}"));
                }
                if !output.status.success() {
                    let code = output.status.code().unwrap_or(-1);
                    warn!(command = %command, exit_code = code, "Command failed");
                    result_text = format!("[exit code: {code}]\n{result_text}");
                }

                Ok(ToolOutput::plain(truncate(result_text.trim())))
            }
            Err(e) => Err(ToolError::ExecutionFailed {
                tool_name: "shell".into(),
                reason: e.to_string(),
            }),
        }
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_OUTPUT_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_OUTPUT_CHARS).collect();
    format!("{head}...(truncated)")
}
