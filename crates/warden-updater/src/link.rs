//! Translation of cluster objects into graph vertices and edges.
//!
//! Both the incremental path and resync go through [`Linker`], so a graph
//! built from a snapshot and one grown from the equivalent events agree.
//!
//! Each object is applied in two steps: `register` records that its vertex
//! exists (and sets the shared flag), `link` reconciles the vertex's edges
//! against the object's references. Edges are only added when the far end
//! has been registered; anything else is skipped and left to resync.
//!
//! Node -> attachment edges come from two places: the node's attachment
//! list and the node named by each attachment object. They are kept
//! whether or not attachment access is enabled; the authorizer applies the
//! gate at request time.

use warden_core::{Edge, Vertex, VertexKind};
use warden_graph::{Graph, GraphError};

use crate::error::Result;
use crate::objects::ClusterObject;

/// Kinds a workload may point at.
const WORKLOAD_TARGETS: [VertexKind; 3] =
    [VertexKind::Secret, VertexKind::ConfigMap, VertexKind::Claim];

pub(crate) struct Linker {
    /// Edges dropped because an endpoint was not registered.
    pub(crate) skipped: u64,
}

impl Linker {
    pub(crate) fn new() -> Self {
        Self { skipped: 0 }
    }

    /// Record the object's vertex and its shared flag.
    pub(crate) fn register(&mut self, graph: &mut Graph, object: &ClusterObject) -> Result<()> {
        let vertex = object.vertex();
        graph.register(vertex.clone())?;

        match object {
            ClusterObject::Secret(s) | ClusterObject::ConfigMap(s) => {
                graph.mark_shared(&vertex, s.shared)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Bring the object's edges in line with its references.
    pub(crate) fn link(&mut self, graph: &mut Graph, object: &ClusterObject) -> Result<()> {
        let vertex = object.vertex();

        match object {
            ClusterObject::Pod(pod) => {
                self.reconcile(graph, &vertex, &WORKLOAD_TARGETS, pod.references())?;

                let node = pod.node_name.as_deref().map(Vertex::node);
                self.reconcile_scheduling(graph, &vertex, node)?;
            }
            ClusterObject::Claim(claim) => {
                let volume = claim.volume_name.as_deref().map(Vertex::volume);
                self.reconcile(graph, &vertex, &[VertexKind::Volume], volume.into_iter().collect())?;
            }
            ClusterObject::Volume(volume) => {
                let secrets = volume
                    .secrets
                    .iter()
                    .map(|s| Vertex::secret(&s.namespace, &s.name))
                    .collect();
                self.reconcile(graph, &vertex, &[VertexKind::Secret], secrets)?;
            }
            ClusterObject::Node(node) => {
                let attachments = node.attachments.iter().map(Vertex::attachment).collect();
                self.reconcile(graph, &vertex, &[VertexKind::Attachment], attachments)?;
            }
            ClusterObject::Attachment(attachment) => {
                let node = Vertex::node(&attachment.node_name);
                if self.observed(graph, &vertex, &node) {
                    graph.add_edge(&edge(node, vertex)?)?;
                }
            }
            ClusterObject::Secret(_) | ClusterObject::ConfigMap(_) => {}
        }
        Ok(())
    }

    /// Make `from`'s outgoing edges of `kinds` exactly `desired`.
    fn reconcile(
        &mut self,
        graph: &mut Graph,
        from: &Vertex,
        kinds: &[VertexKind],
        mut desired: Vec<Vertex>,
    ) -> Result<()> {
        desired.sort();
        desired.dedup();
        desired.retain(|to| self.observed(graph, from, to));

        let view: &Graph = graph;
        let current: Vec<Vertex> = kinds
            .iter()
            .flat_map(|kind| view.targets_of(from, *kind))
            .cloned()
            .collect();

        for stale in current.iter().filter(|v| !desired.contains(v)) {
            graph.remove_edge(&edge(from.clone(), stale.clone())?);
        }
        for to in desired {
            graph.add_edge(&edge(from.clone(), to)?)?;
        }
        Ok(())
    }

    /// Make the workload scheduled on exactly `node`, or on nothing.
    fn reconcile_scheduling(
        &mut self,
        graph: &mut Graph,
        workload: &Vertex,
        node: Option<Vertex>,
    ) -> Result<()> {
        let node = node.filter(|n| self.observed(graph, workload, n));

        let current: Vec<Vertex> = graph
            .sources_of(workload, VertexKind::Node)
            .cloned()
            .collect();
        for stale in current.iter().filter(|n| Some(*n) != node.as_ref()) {
            graph.remove_edge(&edge(stale.clone(), workload.clone())?);
        }
        if let Some(node) = node {
            graph.add_edge(&edge(node, workload.clone())?)?;
        }
        Ok(())
    }

    fn observed(&mut self, graph: &Graph, from: &Vertex, to: &Vertex) -> bool {
        if graph.is_registered(to) {
            return true;
        }
        self.skipped += 1;
        tracing::warn!("Skipping edge {} -> {}: endpoint not observed", from, to);
        false
    }
}

fn edge(from: Vertex, to: Vertex) -> Result<Edge> {
    Ok(Edge::infer(from, to).map_err(GraphError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{
        AttachmentObject, ClaimObject, NodeObject, PodObject, SharedObject, VolumeObject,
    };

    fn apply(linker: &mut Linker, graph: &mut Graph, objects: &[ClusterObject]) {
        for o in objects {
            linker.register(graph, o).unwrap();
        }
        for o in objects {
            linker.link(graph, o).unwrap();
        }
    }

    #[test]
    fn test_pod_links_registered_references_only() {
        let mut linker = Linker::new();
        let mut g = Graph::new();

        apply(
            &mut linker,
            &mut g,
            &[
                NodeObject::new("node0").into(),
                ClusterObject::Secret(SharedObject::new("ns0", "s0")),
                PodObject::new("ns0", "pod0")
                    .on_node("node0")
                    .with_secret("s0")
                    .with_secret("missing")
                    .into(),
            ],
        );

        assert!(g.has_path("node0", &Vertex::secret("ns0", "s0")));
        assert!(!g.has_path("node0", &Vertex::secret("ns0", "missing")));
        assert_eq!(linker.skipped, 1);
    }

    #[test]
    fn test_pod_relink_diffs_references() {
        let mut linker = Linker::new();
        let mut g = Graph::new();

        apply(
            &mut linker,
            &mut g,
            &[
                NodeObject::new("node0").into(),
                NodeObject::new("node1").into(),
                ClusterObject::Secret(SharedObject::new("ns0", "old")),
                ClusterObject::Secret(SharedObject::new("ns0", "new")),
                PodObject::new("ns0", "pod0").on_node("node0").with_secret("old").into(),
            ],
        );
        assert!(g.has_path("node0", &Vertex::secret("ns0", "old")));

        let moved = PodObject::new("ns0", "pod0").on_node("node1").with_secret("new");
        linker.link(&mut g, &moved.into()).unwrap();

        assert!(!g.has_path("node0", &Vertex::secret("ns0", "new")));
        assert!(!g.has_path("node1", &Vertex::secret("ns0", "old")));
        assert!(g.has_path("node1", &Vertex::secret("ns0", "new")));
        assert_eq!(g.stats().edges, 2);
    }

    #[test]
    fn test_claim_binding_clears() {
        let mut linker = Linker::new();
        let mut g = Graph::new();

        apply(
            &mut linker,
            &mut g,
            &[
                VolumeObject::new("pv0").into(),
                ClaimObject::new("ns0", "pvc0").bound_to("pv0").into(),
            ],
        );
        assert!(g.has_edge(&Vertex::claim("ns0", "pvc0"), &Vertex::volume("pv0")));

        linker
            .link(&mut g, &ClaimObject::new("ns0", "pvc0").into())
            .unwrap();
        assert!(!g.has_edge(&Vertex::claim("ns0", "pvc0"), &Vertex::volume("pv0")));
    }

    #[test]
    fn test_node_attachment_list_reconciles() {
        let mut linker = Linker::new();
        let mut g = Graph::new();
        let (node, att) = (Vertex::node("node0"), Vertex::attachment("att0"));

        apply(
            &mut linker,
            &mut g,
            &[
                AttachmentObject::new("att0", "node9", "pv0").into(),
                NodeObject::new("node0").with_attachment("att0").into(),
            ],
        );
        assert!(g.has_edge(&node, &att));

        linker
            .link(&mut g, &NodeObject::new("node0").into())
            .unwrap();
        assert!(!g.has_edge(&node, &att));
    }

    #[test]
    fn test_attachment_object_links_named_node() {
        let mut linker = Linker::new();
        let mut g = Graph::new();

        apply(
            &mut linker,
            &mut g,
            &[
                NodeObject::new("node0").into(),
                AttachmentObject::new("att0", "node0", "pv0").into(),
                AttachmentObject::new("att1", "node1", "pv1").into(),
            ],
        );

        assert!(g.has_path("node0", &Vertex::attachment("att0")));
        assert!(!g.has_path("node1", &Vertex::attachment("att1")));
        assert_eq!(linker.skipped, 1);
    }

    #[test]
    fn test_shared_flag_follows_object() {
        let mut linker = Linker::new();
        let mut g = Graph::new();
        let secret = Vertex::secret("ns0", "s0");

        linker
            .register(&mut g, &ClusterObject::Secret(SharedObject::new("ns0", "s0").shared()))
            .unwrap();
        assert!(g.is_shared(&secret));

        linker
            .register(&mut g, &ClusterObject::Secret(SharedObject::new("ns0", "s0")))
            .unwrap();
        assert!(!g.is_shared(&secret));
        assert!(g.is_registered(&secret));
    }
}
