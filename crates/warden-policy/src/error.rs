//! Error types for the policy module.

use thiserror::Error;

/// Errors that can occur while loading a rule source.
///
/// Evaluation never fails; only loading does. A load error at startup
/// must stop the process from serving decisions.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The rule source is not a well-formed rule list.
    #[error("malformed rule source: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A rule parsed but is unusable.
    #[error("invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
