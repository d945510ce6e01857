//! # Warden Core
//!
//! Pure types for the Warden node authorizer: graph vertices and relations,
//! caller identities, authorization requests and decisions, and feature
//! gates.
//!
//! This crate contains no I/O and no shared state beyond the atomics in
//! [`FeatureGates`].
//!
//! ## Key Types
//!
//! - [`Vertex`] - A typed, uniquely keyed graph vertex
//! - [`Relation`] - The closed set of edge relations
//! - [`Edge`] - A directed edge checked against [`Relation::between`]
//! - [`AuthzRequest`] - An explicit, validated authorization request
//! - [`Verdict`] - A [`Decision`] with its reason
//! - [`FeatureGates`] - Runtime toggles for gated relation patterns

pub mod error;
pub mod feature;
pub mod identity;
pub mod request;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use feature::{Feature, FeatureGates};
pub use identity::{NodeIdentityShape, UserInfo, NODES_GROUP, NODE_USER_PREFIX};
pub use request::{
    AuthzRequest, Decision, GraphResource, RequestBuilder, RequestTarget, ResourceAttributes,
    Verdict, CORE_GROUP, STORAGE_GROUP,
};
pub use types::{Edge, NamespacedName, Relation, Vertex, VertexKind};
pub use validation::validate_request;
