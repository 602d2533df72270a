//! Error types for lexrag.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! text generation, retrieval, prompt rendering and pipeline errors.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for lexrag.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text generation (LLM provider) errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document retrieval and index errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Strategy and batch pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// A provider answered with a non-success HTTP status
    #[error("{service} returned {status}: {message}")]
    ProviderStatus {
        service: String,
        status: u16,
        message: String,
    },

    /// A call to an external collaborator did not finish in time
    #[error("Timed out after {}s: {operation}", .elapsed.as_secs_f64())]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether retrying the same call may succeed.
    ///
    /// Timeouts, transport failures and provider 408/429/5xx replies are
    /// transient. Other provider statuses (unknown model, bad request),
    /// configuration, prompts and serialization problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Timeout { .. } | AppError::Llm(_) | AppError::Retrieval(_) => true,
            AppError::ProviderStatus { status, .. } => {
                matches!(status, 408 | 429) || *status >= 500
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
