//! Proptest generators for property-based testing.
//!
//! Names come from small pools so that generated operations collide on
//! the same vertices often enough to be interesting.

use std::collections::BTreeMap;

use proptest::prelude::*;

use warden_core::{Edge, Vertex};
use warden_graph::Graph;
use warden_updater::{
    AttachmentObject, ClaimObject, ClusterObject, ClusterSnapshot, NodeObject, PodObject,
    SharedObject, VolumeObject,
};

/// Generate an object name from a small pool.
pub fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from)
}

/// Generate a namespace from a small pool.
pub fn namespace() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["ns0", "ns1"]).prop_map(String::from)
}

/// Generate a well-formed vertex of any kind.
pub fn vertex() -> impl Strategy<Value = Vertex> {
    prop_oneof![
        name().prop_map(Vertex::node),
        (namespace(), name()).prop_map(|(ns, n)| Vertex::workload(ns, n)),
        (namespace(), name()).prop_map(|(ns, n)| Vertex::secret(ns, n)),
        (namespace(), name()).prop_map(|(ns, n)| Vertex::config_map(ns, n)),
        (namespace(), name()).prop_map(|(ns, n)| Vertex::claim(ns, n)),
        name().prop_map(Vertex::volume),
        name().prop_map(Vertex::attachment),
    ]
}

/// Generate an edge of a supported relation.
pub fn edge() -> impl Strategy<Value = Edge> {
    (vertex(), vertex())
        .prop_filter_map("unsupported pair", |(from, to)| Edge::infer(from, to).ok())
}

/// Generate a secret or config map vertex.
pub fn shareable() -> impl Strategy<Value = Vertex> {
    prop_oneof![
        (namespace(), name()).prop_map(|(ns, n)| Vertex::secret(ns, n)),
        (namespace(), name()).prop_map(|(ns, n)| Vertex::config_map(ns, n)),
    ]
}

/// A single graph mutation.
#[derive(Debug, Clone)]
pub enum GraphOp {
    AddEdge(Edge),
    RemoveEdge(Edge),
    RemoveVertex(Vertex),
    MarkShared(Vertex, bool),
}

impl GraphOp {
    pub fn apply(&self, graph: &mut Graph) {
        match self {
            GraphOp::AddEdge(e) => {
                let _ = graph.add_edge(e);
            }
            GraphOp::RemoveEdge(e) => {
                graph.remove_edge(e);
            }
            GraphOp::RemoveVertex(v) => {
                graph.remove_vertex(v);
            }
            GraphOp::MarkShared(v, shared) => {
                let _ = graph.mark_shared(v, *shared);
            }
        }
    }
}

/// Generate a graph mutation, biased towards adding edges.
pub fn graph_op() -> impl Strategy<Value = GraphOp> {
    prop_oneof![
        4 => edge().prop_map(GraphOp::AddEdge),
        2 => edge().prop_map(GraphOp::RemoveEdge),
        1 => vertex().prop_map(GraphOp::RemoveVertex),
        1 => (shareable(), any::<bool>()).prop_map(|(v, s)| GraphOp::MarkShared(v, s)),
    ]
}

/// Build a graph by applying a sequence of operations to an empty one.
pub fn graph_from_ops(ops: &[GraphOp]) -> Graph {
    let mut graph = Graph::new();
    for op in ops {
        op.apply(&mut graph);
    }
    graph
}

/// Generate a graph from up to `max_ops` random operations.
pub fn graph(max_ops: usize) -> impl Strategy<Value = Graph> {
    prop::collection::vec(graph_op(), 0..=max_ops).prop_map(|ops| graph_from_ops(&ops))
}

/// Generate a cluster object of any watched kind.
pub fn cluster_object() -> impl Strategy<Value = ClusterObject> {
    let names = || prop::collection::vec(name(), 0..3);

    prop_oneof![
        (name(), names()).prop_map(|(n, atts)| {
            let mut node = NodeObject::new(n);
            node.attachments = atts;
            node.into()
        }),
        (namespace(), name(), prop::option::of(name()), names(), names(), names()).prop_map(
            |(ns, n, node, secrets, config_maps, claims)| {
                let mut pod = PodObject::new(ns, n);
                pod.node_name = node;
                pod.secrets = secrets;
                pod.config_maps = config_maps;
                pod.claims = claims;
                pod.into()
            }
        ),
        (namespace(), name(), any::<bool>()).prop_map(|(ns, n, shared)| {
            let mut s = SharedObject::new(ns, n);
            s.shared = shared;
            ClusterObject::Secret(s)
        }),
        (namespace(), name(), any::<bool>()).prop_map(|(ns, n, shared)| {
            let mut c = SharedObject::new(ns, n);
            c.shared = shared;
            ClusterObject::ConfigMap(c)
        }),
        (namespace(), name(), prop::option::of(name())).prop_map(|(ns, n, volume)| {
            let mut claim = ClaimObject::new(ns, n);
            claim.volume_name = volume;
            claim.into()
        }),
        (name(), prop::collection::vec((namespace(), name()), 0..3)).prop_map(|(n, secrets)| {
            secrets
                .into_iter()
                .fold(VolumeObject::new(n), |v, (ns, s)| v.with_secret(ns, s))
                .into()
        }),
        (name(), name(), name())
            .prop_map(|(n, node, volume)| AttachmentObject::new(n, node, volume).into()),
    ]
}

/// Generate a snapshot of up to `max_objects` objects, at most one per vertex.
pub fn snapshot(max_objects: usize) -> impl Strategy<Value = ClusterSnapshot> {
    prop::collection::vec(cluster_object(), 0..=max_objects).prop_map(|objects| {
        let unique: BTreeMap<Vertex, ClusterObject> =
            objects.into_iter().map(|o| (o.vertex(), o)).collect();
        unique.into_values().collect()
    })
}
