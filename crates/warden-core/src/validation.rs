//! Boundary validation for authorization requests.
//!
//! Validation is structural only: it rejects requests that cannot be
//! interpreted at all. Names that simply do not exist in the graph are not
//! errors; they are answered as "not reachable".

use crate::error::ValidationError;
use crate::request::{AuthzRequest, RequestTarget};

/// Validate the structure of a request.
pub fn validate_request(request: &AuthzRequest) -> Result<(), ValidationError> {
    if request.user().name.is_empty() {
        return Err(ValidationError::MissingUser);
    }

    match request.target() {
        RequestTarget::Resource(attrs) => {
            if attrs.verb.is_empty() {
                return Err(ValidationError::MissingVerb);
            }
            if attrs.resource.is_empty() {
                return Err(ValidationError::MissingResource);
            }
        }
        RequestTarget::NonResource { verb, path } => {
            if verb.is_empty() {
                return Err(ValidationError::MissingVerb);
            }
            if path.is_empty() {
                return Err(ValidationError::MissingPath);
            }
        }
    }

    Ok(())
}
