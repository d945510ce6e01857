//! Authorization requests and decisions.
//!
//! A request is an explicit value with fixed fields. Requests built with
//! [`RequestBuilder`] are validated on construction; requests decoded from
//! the wire are validated again by the authorizer before evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::identity::UserInfo;
use crate::types::Vertex;
use crate::validation::validate_request;

/// API group of the core resource kinds.
pub const CORE_GROUP: &str = "";

/// API group of volume attachments.
pub const STORAGE_GROUP: &str = "storage.k8s.io";

/// The outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    /// Defer to the next authorizer in the chain.
    NoOpinion,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::NoOpinion => "no_opinion",
        };
        f.write_str(s)
    }
}

/// A decision with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: String,
}

impl Verdict {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Allow,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Deny,
            reason: reason.into(),
        }
    }

    pub fn no_opinion(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::NoOpinion,
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}

/// Attributes of a resource-scoped request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    pub verb: String,
    #[serde(default)]
    pub api_group: String,
    pub resource: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// What the request targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestTarget {
    Resource(ResourceAttributes),
    NonResource { verb: String, path: String },
}

/// An authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzRequest {
    user: UserInfo,
    target: RequestTarget,
}

impl AuthzRequest {
    /// Start building a resource request for `user`.
    pub fn builder(user: UserInfo) -> RequestBuilder {
        RequestBuilder::new(user)
    }

    /// A validated non-resource request (e.g. a URL path).
    pub fn non_resource(
        user: UserInfo,
        verb: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let request = Self {
            user,
            target: RequestTarget::NonResource {
                verb: verb.into(),
                path: path.into(),
            },
        };
        validate_request(&request)?;
        Ok(request)
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    /// Resource attributes, or `None` for non-resource requests.
    pub fn resource(&self) -> Option<&ResourceAttributes> {
        match &self.target {
            RequestTarget::Resource(attrs) => Some(attrs),
            RequestTarget::NonResource { .. } => None,
        }
    }
}

/// Builder for resource requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    user: UserInfo,
    attrs: ResourceAttributes,
}

impl RequestBuilder {
    pub fn new(user: UserInfo) -> Self {
        Self {
            user,
            attrs: ResourceAttributes {
                verb: String::new(),
                api_group: CORE_GROUP.to_string(),
                resource: String::new(),
                name: String::new(),
                namespace: String::new(),
            },
        }
    }

    pub fn verb(mut self, verb: impl Into<String>) -> Self {
        self.attrs.verb = verb.into();
        self
    }

    pub fn api_group(mut self, group: impl Into<String>) -> Self {
        self.attrs.api_group = group.into();
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.attrs.resource = resource.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.attrs.name = name.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.attrs.namespace = namespace.into();
        self
    }

    pub fn build(self) -> Result<AuthzRequest, ValidationError> {
        let request = AuthzRequest {
            user: self.user,
            target: RequestTarget::Resource(self.attrs),
        };
        validate_request(&request)?;
        Ok(request)
    }
}

/// Resource kinds the relationship graph can answer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphResource {
    Secret,
    ConfigMap,
    Claim,
    Volume,
    Attachment,
}

impl GraphResource {
    /// Map an (API group, resource) pair to a graph-covered kind.
    pub fn classify(api_group: &str, resource: &str) -> Option<Self> {
        match (api_group, resource) {
            (CORE_GROUP, "secrets") => Some(GraphResource::Secret),
            (CORE_GROUP, "configmaps") => Some(GraphResource::ConfigMap),
            (CORE_GROUP, "persistentvolumeclaims") => Some(GraphResource::Claim),
            (CORE_GROUP, "persistentvolumes") => Some(GraphResource::Volume),
            (STORAGE_GROUP, "volumeattachments") => Some(GraphResource::Attachment),
            _ => None,
        }
    }

    /// Whether objects of this kind live in a namespace.
    pub const fn is_namespaced(self) -> bool {
        matches!(
            self,
            GraphResource::Secret | GraphResource::ConfigMap | GraphResource::Claim
        )
    }

    /// The target vertex for a named object of this kind.
    pub fn vertex(self, namespace: &str, name: &str) -> Vertex {
        match self {
            GraphResource::Secret => Vertex::secret(namespace, name),
            GraphResource::ConfigMap => Vertex::config_map(namespace, name),
            GraphResource::Claim => Vertex::claim(namespace, name),
            GraphResource::Volume => Vertex::volume(name),
            GraphResource::Attachment => Vertex::attachment(name),
        }
    }
}

impl fmt::Display for GraphResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GraphResource::Secret => "secrets",
            GraphResource::ConfigMap => "configmaps",
            GraphResource::Claim => "persistentvolumeclaims",
            GraphResource::Volume => "persistentvolumes",
            GraphResource::Attachment => "volumeattachments",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_resource_request() {
        let request = AuthzRequest::builder(UserInfo::node("node0"))
            .verb("get")
            .resource("secrets")
            .name("secret0")
            .namespace("ns0")
            .build()
            .unwrap();

        let attrs = request.resource().unwrap();
        assert_eq!(attrs.api_group, CORE_GROUP);
        assert_eq!(attrs.name, "secret0");
    }

    #[test]
    fn test_builder_rejects_missing_verb() {
        let err = AuthzRequest::builder(UserInfo::node("node0"))
            .resource("secrets")
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingVerb);
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            GraphResource::classify(STORAGE_GROUP, "volumeattachments"),
            Some(GraphResource::Attachment)
        );
        // Wrong group for the kind.
        assert_eq!(GraphResource::classify(CORE_GROUP, "volumeattachments"), None);
        assert_eq!(GraphResource::classify(CORE_GROUP, "pods"), None);
    }

    #[test]
    fn test_request_decodes_from_json() {
        let json = r#"{
            "user": {"name": "system:node:node0", "groups": ["system:nodes"]},
            "target": {"resource": {"verb": "get", "resource": "configmaps", "name": "cm", "namespace": "ns0"}}
        }"#;
        let request: AuthzRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.resource().unwrap().resource, "configmaps");
    }
}
