//! Error types for the Warden core.

use thiserror::Error;

use crate::types::{Relation, VertexKind};

/// Core errors raised while constructing typed values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("relation {relation} is not allowed from {from} to {to}")]
    InvalidEdge {
        from: String,
        to: String,
        relation: Relation,
    },

    #[error("no relation exists from {from} to {to}")]
    UnsupportedPair { from: VertexKind, to: VertexKind },

    #[error("unknown feature gate: {0}")]
    UnknownFeature(String),

    #[error("malformed feature gate setting: {0}")]
    MalformedFeatureSetting(String),
}

/// Validation errors for inbound authorization requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request has no user name")]
    MissingUser,

    #[error("request has no verb")]
    MissingVerb,

    #[error("resource request has no resource")]
    MissingResource,

    #[error("non-resource request has no path")]
    MissingPath,
}
