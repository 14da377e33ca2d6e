//! Transform error types

use thiserror::Error;

/// Failure of a single transform invocation
///
/// The `Display` text is what ends up in the trace's `error` field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("unknown transform")]
    Unknown,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("transform panicked: {0}")]
    Panicked(String),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TransformError {
    pub fn invalid_option(key: &str, reason: impl Into<String>) -> Self {
        TransformError::InvalidOption {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
