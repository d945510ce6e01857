//! Error types for the updater module.

use thiserror::Error;

/// Errors that can occur while keeping the graph current.
///
/// None of these are fatal to the run loop: a failed event is logged and
/// the next resync repairs whatever it left behind.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// Graph mutation rejected (malformed key, unsupported edge).
    #[error("graph error: {0}")]
    Graph(#[from] warden_graph::GraphError),

    /// Event or snapshot source failed.
    #[error("source error: {0}")]
    Source(String),

    /// The event source has been closed.
    #[error("event source closed")]
    SourceClosed,

    /// Timeout waiting on a source.
    #[error("timeout: {0}")]
    Timeout(String),
}

/// Result type for updater operations.
pub type Result<T> = std::result::Result<T, UpdaterError>;
