//! Error types for the graph module.

use thiserror::Error;

use warden_core::{CoreError, VertexKind};

/// Errors that can occur during graph mutations.
///
/// Queries never fail: a lookup miss is reported as "not reachable".
#[derive(Debug, Error)]
pub enum GraphError {
    /// Edge construction rejected by the relation set.
    #[error("invalid edge: {0}")]
    InvalidEdge(#[from] CoreError),

    /// A vertex key with an empty name or namespace.
    #[error("malformed vertex key: {0}")]
    MalformedKey(String),

    /// The shared flag only applies to secrets and config maps.
    #[error("vertex kind {0} cannot be shared")]
    NotShareable(VertexKind),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
