//! Configuration loading and validation for Emberclaw.
//!
//! Loads configuration from `~/.emberclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.emberclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the reasoning service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Reasoning service configuration
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Skill registry configuration
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Memory collaborator configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Tool safety settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Streaming consumer tuning
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("reasoning", &self.reasoning)
            .field("skills", &self.skills)
            .field("memory", &self.memory)
            .field("tools", &self.tools)
            .field("stream", &self.stream)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Root directory scanned for skill definitions
    /// (one subdirectory per skill, each containing SKILL.md)
    #[serde(default = "default_skills_root")]
    pub root: PathBuf,
}

fn default_skills_root() -> PathBuf {
    AppConfig::config_dir().join("skills")
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            root: default_skills_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Optional path to the long-term memory file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Maximum excerpt length injected into the context, in characters
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

fn default_excerpt_chars() -> usize {
    2000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            file: None,
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// If non-empty, only these shell commands are allowed
    #[serde(default)]
    pub allowed_commands: Vec<String>,

    /// Allowed root directories for file tools (empty = allow all)
    #[serde(default)]
    pub allowed_roots: Vec<String>,

    /// Forbidden path prefixes for file tools
    #[serde(default = "default_forbidden_paths")]
    pub forbidden_paths: Vec<String>,

    /// Shell command timeout in seconds
    #[serde(default = "default_shell_timeout")]
    pub shell_timeout_secs: u64,
}

fn default_forbidden_paths() -> Vec<String> {
    vec!["/etc".into(), "/root".into()]
}
fn default_shell_timeout() -> u64 {
    60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_commands: Vec::new(),
            allowed_roots: Vec::new(),
            forbidden_paths: default_forbidden_paths(),
            shell_timeout_secs: default_shell_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Consumer channel poll timeout in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long the consumer waits for the producer after cancellation
    #[serde(default = "default_cancel_grace")]
    pub cancel_grace_ms: u64,
}

fn default_poll_interval() -> u64 {
    100
}
fn default_cancel_grace() -> u64 {
    1500
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            cancel_grace_ms: default_cancel_grace(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.emberclaw/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `EMBERCLAW_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("EMBERCLAW_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("EMBERCLAW_MODEL") {
            config.reasoning.model = model;
        }

        if let Ok(url) = std::env::var("EMBERCLAW_BASE_URL") {
            config.reasoning.base_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".emberclaw")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.reasoning.temperature < 0.0 || self.reasoning.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "reasoning.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.stream.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "stream.poll_interval_ms must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            reasoning: ReasoningConfig::default(),
            skills: SkillsConfig::default(),
            memory: MemoryConfig::default(),
            tools: ToolsConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.reasoning.model, "gpt-4o-mini");
        assert_eq!(config.tools.shell_timeout_secs, 60);
        assert_eq!(config.stream.poll_interval_ms, 100);
        assert!(!config.has_api_key());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config =
            AppConfig::load_from(Path::new("/nonexistent/emberclaw/config.toml")).unwrap();
        assert_eq!(config.reasoning.base_url, default_base_url());
    }

    #[test]
    fn load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
api_key = "sk-test"

[reasoning]
model = "deepseek-chat"
base_url = "https://api.deepseek.com/v1"

[tools]
allowed_commands = ["ls", "cat"]

[stream]
poll_interval_ms = 50
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.reasoning.model, "deepseek-chat");
        assert_eq!(config.tools.allowed_commands, vec!["ls", "cat"]);
        assert_eq!(config.stream.poll_interval_ms, 50);
        // Unspecified sections keep defaults
        assert_eq!(config.memory.excerpt_chars, 2000);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[reasoning]\ntemperature = 9.0\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[stream]\npoll_interval_ms = 0\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
