//! Error types for dbchat.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for dbchat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// A required input is empty (API key, remote connection fields).
    ///
    /// These are reported inline and halt the current interaction cycle
    /// without ending it as a failure.
    #[error("{0}")]
    MissingInput(String),

    /// Database connection errors (file missing, host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, read-only violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Agent loop errors (unparsable model output).
    #[error("Agent error: {0}")]
    Agent(String),

    /// Configuration errors (invalid config file, unknown mode, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal failures, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Creates a missing-input error with the given message.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates an agent error with the given message.
    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for errors that are shown inline and stop the cycle quietly.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "Missing Configuration",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Agent(_) => "Agent Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ChatError.
pub type Result<T> = std::result::Result<T, ChatError>;
