//! Error types for the authorizer.

use thiserror::Error;

use warden_core::{CoreError, ValidationError};
use warden_policy::PolicyError;
use warden_updater::UpdaterError;

/// Errors that can occur while authorizing or bootstrapping.
///
/// An unknown resource kind or a non-node caller is not an error; those
/// are answered with NoOpinion or by the policy engine.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The request is structurally invalid.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Bad configuration (e.g. an unknown feature gate).
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// The rule source could not be loaded.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// The graph updater stopped with an error.
    #[error("updater error: {0}")]
    Updater(#[from] UpdaterError),

    /// A delegated authority failed.
    #[error("authority {authority} failed: {message}")]
    Delegate { authority: String, message: String },
}

/// Result type for authorizer operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
