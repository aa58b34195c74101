//! Structured error types for tidyagent
//!
//! Every fallible operation in the core crate returns [`CleanError`]. The
//! variants carry enough context for a one-line user message, and the
//! provider variants drive the retry policy of the LLM backend.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Primary error type for tidyagent operations
#[derive(Error, Debug)]
pub enum CleanError {
    // =========================================================================
    // Provider / API Errors
    // =========================================================================
    /// Authentication/authorization errors
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded (429)
    #[error("rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Provider returned a non-success status
    #[error("provider error: {status} - {message}")]
    ProviderError { status: u16, message: String },

    /// Provider answered 200 but the body could not be used
    #[error("malformed provider response: {message}")]
    MalformedResponse { message: String },

    /// Network/connection error
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Request timed out
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    // =========================================================================
    // Dataset Errors
    // =========================================================================
    #[error("dataset is empty: {reason}")]
    EmptyDataset { reason: String },

    #[error("row at line {line} has {found} fields, expected {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name: {name}")]
    DuplicateHeader { name: String },

    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // =========================================================================
    // Agent Errors
    // =========================================================================
    /// Graph was built with an inconsistent topology
    #[error("invalid graph: {message}")]
    Graph { message: String },

    /// Graph execution did not reach END within the step budget
    #[error("graph exceeded recursion limit of {limit} steps")]
    GraphRecursionLimit { limit: usize },

    /// One batch of the agent run failed
    #[error("batch {index} failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<CleanError>,
    },

    // =========================================================================
    // User Input Errors
    // =========================================================================
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    // =========================================================================
    // External Error Wrappers
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(String),
}

impl CleanError {
    /// Shorthand for [`CleanError::InvalidInput`]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for [`CleanError::InvalidConfig`]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::Timeout { .. } => true,
            Self::RateLimitExceeded { .. } => true,

            Self::ProviderError { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),

            Self::BatchFailed { source, .. } => source.is_retryable(),

            Self::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),

            Self::Unauthorized { .. }
            | Self::MalformedResponse { .. }
            | Self::InvalidConfig { .. }
            | Self::MissingConfig { .. }
            | Self::EmptyDataset { .. }
            | Self::RaggedRow { .. }
            | Self::DuplicateHeader { .. }
            | Self::UnknownColumn { .. }
            | Self::Csv(_)
            | Self::Graph { .. }
            | Self::GraphRecursionLimit { .. }
            | Self::InvalidInput { .. }
            | Self::FileNotFound { .. }
            | Self::Json(_)
            | Self::Toml(_) => false,
        }
    }

    /// Get suggested retry delay for retryable errors
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => {
                Some(retry_after.unwrap_or(Duration::from_secs(5)))
            }
            Self::ProviderError { status: 503, .. } => Some(Duration::from_secs(10)),
            Self::ConnectionFailed { .. } => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    /// Check if error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::InvalidConfig { .. } | Self::MissingConfig { .. }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => {
                "Authentication failed. Please check your API key.".to_string()
            }
            Self::MissingConfig { key } => {
                format!("'{}' is not set. Add it to .env or export it in your shell.", key)
            }
            Self::RaggedRow { line, .. } => {
                format!("The CSV file is malformed near line {}.", line)
            }
            Self::BatchFailed { index, source } => {
                format!("Batch {} could not be cleaned: {}", index, source.user_message())
            }
            _ => self.to_string(),
        }
    }
}

impl From<toml::de::Error> for CleanError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for CleanError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Toml(err.to_string())
    }
}

impl From<reqwest::Error> for CleanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                duration: Duration::ZERO,
            }
        } else if err.is_decode() {
            Self::MalformedResponse {
                message: err.to_string(),
            }
        } else {
            Self::ConnectionFailed {
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias using CleanError
pub type Result<T> = std::result::Result<T, CleanError>;

/// Extension trait for converting Option to Result with CleanError
pub trait OptionExt<T> {
    fn ok_or_unknown_column(self, name: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_column(self, name: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| CleanError::UnknownColumn { name: name.into() })
    }
}
