//! Cluster object shapes consumed by the updater.
//!
//! These carry only the fields that participate in relationships. Every
//! object maps to exactly one vertex; its reference fields map to the
//! outgoing edges of that vertex.

use serde::{Deserialize, Serialize};

use warden_core::{NamespacedName, Vertex, VertexKind};

/// A workload (pod) and everything it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodObject {
    pub namespace: String,
    pub name: String,
    /// Unset until the workload is scheduled.
    #[serde(default)]
    pub node_name: Option<String>,
    /// Secret names, in the workload's namespace.
    #[serde(default)]
    pub secrets: Vec<String>,
    /// Config map names, in the workload's namespace.
    #[serde(default)]
    pub config_maps: Vec<String>,
    /// Claim names, in the workload's namespace.
    #[serde(default)]
    pub claims: Vec<String>,
}

impl PodObject {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            node_name: None,
            secrets: Vec::new(),
            config_maps: Vec::new(),
            claims: Vec::new(),
        }
    }

    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.node_name = Some(node.into());
        self
    }

    pub fn with_secret(mut self, name: impl Into<String>) -> Self {
        self.secrets.push(name.into());
        self
    }

    pub fn with_config_map(mut self, name: impl Into<String>) -> Self {
        self.config_maps.push(name.into());
        self
    }

    pub fn with_claim(mut self, name: impl Into<String>) -> Self {
        self.claims.push(name.into());
        self
    }

    /// Vertices this workload references, deduplicated.
    pub fn references(&self) -> Vec<Vertex> {
        let mut refs: Vec<Vertex> = self
            .secrets
            .iter()
            .map(|s| Vertex::secret(&self.namespace, s))
            .chain(self.config_maps.iter().map(|c| Vertex::config_map(&self.namespace, c)))
            .chain(self.claims.iter().map(|c| Vertex::claim(&self.namespace, c)))
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }
}

/// A cluster node and the attachments it reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeObject {
    pub name: String,
    /// Names of volume attachments on this node.
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NodeObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, name: impl Into<String>) -> Self {
        self.attachments.push(name.into());
        self
    }
}

/// A secret or config map. Only the shared flag matters to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedObject {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub shared: bool,
}

impl SharedObject {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            shared: false,
        }
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }
}

/// A persistent volume claim and its binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimObject {
    pub namespace: String,
    pub name: String,
    /// Unset while the claim is pending.
    #[serde(default)]
    pub volume_name: Option<String>,
}

impl ClaimObject {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            volume_name: None,
        }
    }

    pub fn bound_to(mut self, volume: impl Into<String>) -> Self {
        self.volume_name = Some(volume.into());
        self
    }
}

/// A persistent volume and the secrets its driver consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeObject {
    pub name: String,
    #[serde(default)]
    pub secrets: Vec<NamespacedName>,
}

impl VolumeObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secrets: Vec::new(),
        }
    }

    pub fn with_secret(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.secrets.push(NamespacedName::new(namespace, name));
        self
    }
}

/// A volume attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentObject {
    pub name: String,
    pub node_name: String,
    pub volume_name: String,
}

impl AttachmentObject {
    pub fn new(
        name: impl Into<String>,
        node_name: impl Into<String>,
        volume_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            node_name: node_name.into(),
            volume_name: volume_name.into(),
        }
    }
}

/// Any object the updater watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object")]
pub enum ClusterObject {
    Node(NodeObject),
    Pod(PodObject),
    Secret(SharedObject),
    ConfigMap(SharedObject),
    Claim(ClaimObject),
    Volume(VolumeObject),
    Attachment(AttachmentObject),
}

impl ClusterObject {
    /// The vertex this object owns.
    pub fn vertex(&self) -> Vertex {
        match self {
            ClusterObject::Node(n) => Vertex::node(&n.name),
            ClusterObject::Pod(p) => Vertex::workload(&p.namespace, &p.name),
            ClusterObject::Secret(s) => Vertex::secret(&s.namespace, &s.name),
            ClusterObject::ConfigMap(c) => Vertex::config_map(&c.namespace, &c.name),
            ClusterObject::Claim(c) => Vertex::claim(&c.namespace, &c.name),
            ClusterObject::Volume(v) => Vertex::volume(&v.name),
            ClusterObject::Attachment(a) => Vertex::attachment(&a.name),
        }
    }

    pub fn kind(&self) -> VertexKind {
        self.vertex().kind()
    }
}

impl From<NodeObject> for ClusterObject {
    fn from(o: NodeObject) -> Self {
        ClusterObject::Node(o)
    }
}

impl From<PodObject> for ClusterObject {
    fn from(o: PodObject) -> Self {
        ClusterObject::Pod(o)
    }
}

impl From<ClaimObject> for ClusterObject {
    fn from(o: ClaimObject) -> Self {
        ClusterObject::Claim(o)
    }
}

impl From<VolumeObject> for ClusterObject {
    fn from(o: VolumeObject) -> Self {
        ClusterObject::Volume(o)
    }
}

impl From<AttachmentObject> for ClusterObject {
    fn from(o: AttachmentObject) -> Self {
        ClusterObject::Attachment(o)
    }
}

/// A complete listing of current cluster objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub objects: Vec<ClusterObject>,
}

impl ClusterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: impl Into<ClusterObject>) {
        self.objects.push(object.into());
    }

    pub fn with(mut self, object: impl Into<ClusterObject>) -> Self {
        self.push(object);
        self
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<ClusterObject> for ClusterSnapshot {
    fn from_iter<I: IntoIterator<Item = ClusterObject>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_references_are_namespaced_and_deduplicated() {
        let pod = PodObject::new("ns0", "pod0")
            .with_secret("s0")
            .with_secret("s0")
            .with_config_map("cm0")
            .with_claim("pvc0");

        assert_eq!(
            pod.references(),
            vec![
                Vertex::secret("ns0", "s0"),
                Vertex::config_map("ns0", "cm0"),
                Vertex::claim("ns0", "pvc0"),
            ]
        );
    }

    #[test]
    fn test_object_vertex() {
        let obj = ClusterObject::from(AttachmentObject::new("att0", "node0", "pv0"));
        assert_eq!(obj.vertex(), Vertex::attachment("att0"));
        assert_eq!(obj.kind(), VertexKind::Attachment);

        let secret = ClusterObject::Secret(SharedObject::new("ns0", "s0").shared());
        assert_eq!(secret.vertex(), Vertex::secret("ns0", "s0"));
    }

    #[test]
    fn test_object_json_shape() {
        let json = r#"{"kind":"Pod","object":{"namespace":"ns0","name":"pod0","nodeName":"node0","secrets":["s0"]}}"#;
        let obj: ClusterObject = serde_json::from_str(json).unwrap();
        let ClusterObject::Pod(pod) = obj else {
            panic!("expected a pod");
        };
        assert_eq!(pod.node_name.as_deref(), Some("node0"));
        assert!(pod.claims.is_empty());
    }
}
