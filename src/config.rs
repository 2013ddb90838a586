//! Configuration management for dbchat.
//!
//! Handles loading configuration from TOML files and environment variables:
//! LLM provider settings, the database mode, remote connection defaults,
//! handle cache lifetime and agent limits.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// File name of the bundled sample database.
pub const EMBEDDED_DB_FILE: &str = "student.db";

/// Default lifetime of a cached database handle (two hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 2 * 60 * 60;

/// Main configuration structure for dbchat.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Database mode selection.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Defaults for the remote connection form.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Handle cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Agent loop limits.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "gpt-4o-mini").
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
        }
    }
}

/// Which database the user chats with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    /// Bundled local SQLite file, opened read-only.
    #[default]
    #[serde(alias = "sqlite", alias = "local")]
    Embedded,
    /// User-supplied MySQL server.
    #[serde(alias = "mysql")]
    Remote,
}

impl DatabaseMode {
    /// Returns the mode as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Remote => "remote",
        }
    }

    /// Returns the label shown in the mode selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Embedded => "Use SQLite 3 database - student.db",
            Self::Remote => "Connect to your MySQL database",
        }
    }

    /// Returns the other mode.
    pub fn toggle(self) -> Self {
        match self {
            Self::Embedded => Self::Remote,
            Self::Remote => Self::Embedded,
        }
    }
}

impl FromStr for DatabaseMode {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "embedded" | "sqlite" | "local" => Ok(Self::Embedded),
            "remote" | "mysql" => Ok(Self::Remote),
            other => Err(ChatError::config(format!(
                "Unknown database mode '{other}'. Expected 'embedded' or 'remote'"
            ))),
        }
    }
}

impl fmt::Display for DatabaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Database mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Mode selected at startup.
    #[serde(default)]
    pub mode: DatabaseMode,

    /// Overrides the location of the embedded SQLite file.
    pub embedded_path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Returns the embedded database path, falling back to the file next to the executable.
    pub fn resolve_embedded_path(&self) -> PathBuf {
        self.embedded_path
            .clone()
            .unwrap_or_else(default_embedded_path)
    }
}

/// Returns `<directory of the running executable>/student.db`.
pub fn default_embedded_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(EMBEDDED_DB_FILE)))
        .unwrap_or_else(|| PathBuf::from(EMBEDDED_DB_FILE))
}

/// Defaults for the remote MySQL form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Server host, optionally with `:port`.
    pub host: Option<String>,

    /// Login user.
    pub user: Option<String>,

    /// Database name.
    pub database: Option<String>,

    /// Password (not recommended to store in config; prefer `MYSQL_PWD`).
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl RemoteConfig {
    /// Applies the MySQL client environment variables as defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.host.is_none() {
            self.host = std::env::var("MYSQL_HOST").ok();
        }
        if self.user.is_none() {
            self.user = std::env::var("MYSQL_USER").ok();
        }
        if self.database.is_none() {
            self.database = std::env::var("MYSQL_DATABASE").ok();
        }
        if self.password.is_none() {
            self.password = std::env::var("MYSQL_PWD").ok();
        }
    }
}

/// Handle cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a database handle stays reusable.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Returns the TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Agent loop limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    /// Maximum number of reasoning steps before the agent gives up.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Row limit the agent is told to apply to its queries.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_iterations() -> usize {
    15
}

fn default_top_k() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            top_k: default_top_k(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbchat")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ChatError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
