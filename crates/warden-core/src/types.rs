//! Strong type definitions for graph vertices, relations and edges.
//!
//! The relation set is closed: every [`Edge`] is checked against
//! [`Relation::between`] at construction, so an edge type outside the
//! fixed set cannot be expressed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A namespaced object key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Both halves are non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Debug for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Discriminator for [`Vertex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexKind {
    Node,
    Workload,
    Secret,
    ConfigMap,
    Claim,
    Volume,
    Attachment,
}

impl VertexKind {
    /// Whether a vertex of this kind may carry the shared flag.
    pub const fn can_be_shared(self) -> bool {
        matches!(self, VertexKind::Secret | VertexKind::ConfigMap)
    }

    /// Whether vertices of this kind are keyed by namespace and name.
    pub const fn is_namespaced(self) -> bool {
        matches!(
            self,
            VertexKind::Workload | VertexKind::Secret | VertexKind::ConfigMap | VertexKind::Claim
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            VertexKind::Node => "node",
            VertexKind::Workload => "workload",
            VertexKind::Secret => "secret",
            VertexKind::ConfigMap => "configmap",
            VertexKind::Claim => "claim",
            VertexKind::Volume => "volume",
            VertexKind::Attachment => "attachment",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, uniquely keyed vertex in the relationship graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum Vertex {
    /// A cluster node, keyed by node name.
    Node(String),
    /// A scheduled workload (pod).
    Workload(NamespacedName),
    Secret(NamespacedName),
    ConfigMap(NamespacedName),
    /// A persistent volume claim.
    Claim(NamespacedName),
    /// A cluster-scoped persistent volume.
    Volume(String),
    /// A cluster-scoped volume attachment, keyed by object name.
    Attachment(String),
}

impl Vertex {
    pub fn node(name: impl Into<String>) -> Self {
        Vertex::Node(name.into())
    }

    pub fn workload(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Vertex::Workload(NamespacedName::new(namespace, name))
    }

    pub fn secret(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Vertex::Secret(NamespacedName::new(namespace, name))
    }

    pub fn config_map(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Vertex::ConfigMap(NamespacedName::new(namespace, name))
    }

    pub fn claim(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Vertex::Claim(NamespacedName::new(namespace, name))
    }

    pub fn volume(name: impl Into<String>) -> Self {
        Vertex::Volume(name.into())
    }

    pub fn attachment(name: impl Into<String>) -> Self {
        Vertex::Attachment(name.into())
    }

    pub fn kind(&self) -> VertexKind {
        match self {
            Vertex::Node(_) => VertexKind::Node,
            Vertex::Workload(_) => VertexKind::Workload,
            Vertex::Secret(_) => VertexKind::Secret,
            Vertex::ConfigMap(_) => VertexKind::ConfigMap,
            Vertex::Claim(_) => VertexKind::Claim,
            Vertex::Volume(_) => VertexKind::Volume,
            Vertex::Attachment(_) => VertexKind::Attachment,
        }
    }

    /// A key is malformed when any of its name parts is empty.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Vertex::Node(name) | Vertex::Volume(name) | Vertex::Attachment(name) => !name.is_empty(),
            Vertex::Workload(nn) | Vertex::Secret(nn) | Vertex::ConfigMap(nn) | Vertex::Claim(nn) => {
                nn.is_well_formed()
            }
        }
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertex::Node(name) | Vertex::Volume(name) | Vertex::Attachment(name) => {
                write!(f, "{}:{}", self.kind(), name)
            }
            Vertex::Workload(nn) | Vertex::Secret(nn) | Vertex::ConfigMap(nn) | Vertex::Claim(nn) => {
                write!(f, "{}:{}", self.kind(), nn)
            }
        }
    }
}

/// The closed set of relations an edge may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Node → Workload: the workload is scheduled on the node.
    ScheduledOn,
    /// Workload → Secret / ConfigMap: the workload references the object.
    References,
    /// Workload → Claim: the workload mounts the claim.
    Mounts,
    /// Claim → Volume: the claim is bound to the volume.
    BoundTo,
    /// Node → Attachment: the volume attachment targets the node.
    AttachedTo,
    /// Volume → Secret: the volume consumes the secret.
    ConsumesSecret,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::ScheduledOn,
        Relation::References,
        Relation::Mounts,
        Relation::BoundTo,
        Relation::AttachedTo,
        Relation::ConsumesSecret,
    ];

    /// The only relation allowed between two vertex kinds, if any.
    pub const fn between(from: VertexKind, to: VertexKind) -> Option<Relation> {
        use VertexKind::*;
        match (from, to) {
            (Node, Workload) => Some(Relation::ScheduledOn),
            (Workload, Secret) | (Workload, ConfigMap) => Some(Relation::References),
            (Workload, Claim) => Some(Relation::Mounts),
            (Claim, Volume) => Some(Relation::BoundTo),
            (Node, Attachment) => Some(Relation::AttachedTo),
            (Volume, Secret) => Some(Relation::ConsumesSecret),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::ScheduledOn => "scheduled_on",
            Relation::References => "references",
            Relation::Mounts => "mounts",
            Relation::BoundTo => "bound_to",
            Relation::AttachedTo => "attached_to",
            Relation::ConsumesSecret => "consumes_secret",
        };
        f.write_str(s)
    }
}

/// A directed, typed edge.
///
/// Only constructible through [`Edge::new`] or [`Edge::infer`], both of
/// which reject pairs outside the fixed relation set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    from: Vertex,
    to: Vertex,
    relation: Relation,
}

impl Edge {
    /// Create an edge, checking that `relation` is the one allowed
    /// between the endpoint kinds.
    pub fn new(from: Vertex, to: Vertex, relation: Relation) -> Result<Self, CoreError> {
        match Relation::between(from.kind(), to.kind()) {
            Some(allowed) if allowed == relation => Ok(Self { from, to, relation }),
            _ => Err(CoreError::InvalidEdge {
                from: from.to_string(),
                to: to.to_string(),
                relation,
            }),
        }
    }

    /// Create an edge whose relation is implied by the endpoint kinds.
    pub fn infer(from: Vertex, to: Vertex) -> Result<Self, CoreError> {
        match Relation::between(from.kind(), to.kind()) {
            Some(relation) => Ok(Self { from, to, relation }),
            None => Err(CoreError::UnsupportedPair {
                from: from.kind(),
                to: to.kind(),
            }),
        }
    }

    pub fn from(&self) -> &Vertex {
        &self.from
    }

    pub fn to(&self) -> &Vertex {
        &self.to
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn into_parts(self) -> (Vertex, Vertex, Relation) {
        (self.from, self.to, self.relation)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.relation, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_between_is_closed() {
        let kinds = [
            VertexKind::Node,
            VertexKind::Workload,
            VertexKind::Secret,
            VertexKind::ConfigMap,
            VertexKind::Claim,
            VertexKind::Volume,
            VertexKind::Attachment,
        ];

        let allowed: usize = kinds
            .iter()
            .flat_map(|a| kinds.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| Relation::between(*a, *b).is_some())
            .count();
        assert_eq!(allowed, 7);

        for kind in kinds {
            assert!(Relation::between(kind, kind).is_none(), "self loop on {kind}");
        }
    }

    #[test]
    fn test_edge_rejects_wrong_relation() {
        let err = Edge::new(
            Vertex::node("node0"),
            Vertex::workload("ns0", "pod0"),
            Relation::Mounts,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidEdge { .. }));
    }

    #[test]
    fn test_edge_infer() {
        let edge = Edge::infer(Vertex::claim("ns0", "pvc0"), Vertex::volume("pv0")).unwrap();
        assert_eq!(edge.relation(), Relation::BoundTo);

        assert!(Edge::infer(Vertex::secret("ns0", "s"), Vertex::node("node0")).is_err());
    }

    #[test]
    fn test_vertex_display() {
        assert_eq!(Vertex::secret("ns0", "secret0").to_string(), "secret:ns0/secret0");
        assert_eq!(Vertex::node("node0").to_string(), "node:node0");
    }

    #[test]
    fn test_malformed_keys() {
        assert!(!Vertex::node("").is_well_formed());
        assert!(!Vertex::secret("", "x").is_well_formed());
        assert!(Vertex::volume("pv0").is_well_formed());
    }
}
