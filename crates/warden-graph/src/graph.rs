//! The relationship graph as typed adjacency maps.
//!
//! [`Graph`] is a plain, single-owner data structure. Concurrency is the
//! job of [`crate::GraphStore`], which wraps it.
//!
//! Vertices are implicit: a vertex exists while an edge touches it, it is
//! registered, or it carries the shared flag. Emptied adjacency sets are
//! dropped eagerly so unreferenced vertices leave no trace.

use std::collections::{HashMap, HashSet};
use std::fmt;

use warden_core::{Edge, Vertex, VertexKind};

use crate::error::{GraphError, Result};

/// How a node reaches a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reach {
    /// The target carries the shared flag.
    Shared,
    /// A path of fixed shape, starting at the node and ending at the target.
    Path(Vec<Vertex>),
}

impl fmt::Display for Reach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reach::Shared => f.write_str("shared"),
            Reach::Path(hops) => {
                for (i, hop) in hops.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    write!(f, "{}", hop)?;
                }
                Ok(())
            }
        }
    }
}

/// Counters describing a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub vertices: usize,
    pub edges: usize,
    pub registered: usize,
    pub shared: usize,
}

/// Directed relationship graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Adjacency: vertex -> vertices it points to.
    outgoing: HashMap<Vertex, HashSet<Vertex>>,

    /// Reverse adjacency, for cascading removal.
    incoming: HashMap<Vertex, HashSet<Vertex>>,

    /// Vertices whose owning object has been observed.
    registered: HashSet<Vertex>,

    /// Secrets and config maps reachable from every node.
    shared: HashSet<Vertex>,

    edge_count: usize,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert an edge. Returns `false` if it was already present.
    pub fn add_edge(&mut self, edge: &Edge) -> Result<bool> {
        check_key(edge.from())?;
        check_key(edge.to())?;

        let inserted = self
            .outgoing
            .entry(edge.from().clone())
            .or_default()
            .insert(edge.to().clone());

        if inserted {
            self.incoming
                .entry(edge.to().clone())
                .or_default()
                .insert(edge.from().clone());
            self.edge_count += 1;
        }

        Ok(inserted)
    }

    /// Remove an edge. Returns `false` if it was absent.
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        let removed = detach(&mut self.outgoing, edge.from(), edge.to());
        if removed {
            detach(&mut self.incoming, edge.to(), edge.from());
            self.edge_count -= 1;
        }
        removed
    }

    /// Remove a vertex and every edge touching it.
    ///
    /// Returns the number of edges removed.
    pub fn remove_vertex(&mut self, vertex: &Vertex) -> usize {
        let mut removed = 0;

        if let Some(targets) = self.outgoing.remove(vertex) {
            for target in &targets {
                detach(&mut self.incoming, target, vertex);
            }
            removed += targets.len();
        }

        if let Some(sources) = self.incoming.remove(vertex) {
            for source in &sources {
                detach(&mut self.outgoing, source, vertex);
            }
            removed += sources.len();
        }

        self.registered.remove(vertex);
        self.shared.remove(vertex);
        self.edge_count -= removed;
        removed
    }

    /// Set or clear the shared flag. Returns `true` if the flag changed.
    pub fn mark_shared(&mut self, vertex: &Vertex, shared: bool) -> Result<bool> {
        check_key(vertex)?;
        if !vertex.kind().can_be_shared() {
            return Err(GraphError::NotShareable(vertex.kind()));
        }

        Ok(if shared {
            self.shared.insert(vertex.clone())
        } else {
            self.shared.remove(vertex)
        })
    }

    /// Record that the object owning `vertex` exists.
    pub fn register(&mut self, vertex: Vertex) -> Result<bool> {
        check_key(&vertex)?;
        Ok(self.registered.insert(vertex))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_registered(&self, vertex: &Vertex) -> bool {
        self.registered.contains(vertex)
    }

    pub fn is_shared(&self, vertex: &Vertex) -> bool {
        self.shared.contains(vertex)
    }

    pub fn has_edge(&self, from: &Vertex, to: &Vertex) -> bool {
        self.outgoing
            .get(from)
            .map_or(false, |targets| targets.contains(to))
    }

    /// Whether the vertex exists in any form.
    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        self.registered.contains(vertex)
            || self.shared.contains(vertex)
            || self.outgoing.contains_key(vertex)
            || self.incoming.contains_key(vertex)
    }

    /// Vertices of `kind` that `from` points to.
    pub fn targets_of<'a>(
        &'a self,
        from: &Vertex,
        kind: VertexKind,
    ) -> impl Iterator<Item = &'a Vertex> + 'a {
        self.outgoing
            .get(from)
            .into_iter()
            .flatten()
            .filter(move |v| v.kind() == kind)
    }

    /// Vertices of `kind` pointing at `to`.
    pub fn sources_of<'a>(
        &'a self,
        to: &Vertex,
        kind: VertexKind,
    ) -> impl Iterator<Item = &'a Vertex> + 'a {
        self.incoming
            .get(to)
            .into_iter()
            .flatten()
            .filter(move |v| v.kind() == kind)
    }

    /// All edges, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.outgoing.iter().flat_map(|(from, targets)| {
            targets
                .iter()
                .filter_map(move |to| Edge::infer(from.clone(), to.clone()).ok())
        })
    }

    pub fn registered(&self) -> impl Iterator<Item = &Vertex> {
        self.registered.iter()
    }

    pub fn shared(&self) -> impl Iterator<Item = &Vertex> {
        self.shared.iter()
    }

    pub fn stats(&self) -> GraphStats {
        let mut vertices: HashSet<&Vertex> = HashSet::new();
        vertices.extend(self.outgoing.keys());
        vertices.extend(self.incoming.keys());
        vertices.extend(self.registered.iter());
        vertices.extend(self.shared.iter());

        GraphStats {
            vertices: vertices.len(),
            edges: self.edge_count,
            registered: self.registered.len(),
            shared: self.shared.len(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reachability
    // ─────────────────────────────────────────────────────────────────────────

    /// Find how `node_name` reaches `target`, if it does.
    ///
    /// Only the fixed shapes are tried:
    ///
    /// ```text
    /// secret     : shared | node -> workload -> secret
    ///                     | node -> workload -> claim -> volume -> secret
    /// configmap  : shared | node -> workload -> configmap
    /// claim      : node -> workload -> claim
    /// volume     : node -> workload -> claim -> volume
    /// attachment : node -> attachment
    /// ```
    ///
    /// Work is bounded by the node's out-degree times the fan-out of its
    /// workloads; the rest of the graph is never visited.
    pub fn find_path(&self, node_name: &str, target: &Vertex) -> Option<Reach> {
        if node_name.is_empty() || !target.is_well_formed() {
            return None;
        }
        let node = Vertex::node(node_name);

        match target {
            Vertex::Secret(_) => self
                .shared_reach(target)
                .or_else(|| self.via_workload(&node, target))
                .or_else(|| self.via_volume(&node, target)),
            Vertex::ConfigMap(_) => self
                .shared_reach(target)
                .or_else(|| self.via_workload(&node, target)),
            Vertex::Claim(_) => self.via_workload(&node, target),
            Vertex::Volume(_) => self.via_claim(&node, target),
            Vertex::Attachment(_) => self
                .has_edge(&node, target)
                .then(|| Reach::Path(vec![node.clone(), target.clone()])),
            Vertex::Node(_) | Vertex::Workload(_) => None,
        }
    }

    pub fn has_path(&self, node_name: &str, target: &Vertex) -> bool {
        self.find_path(node_name, target).is_some()
    }

    fn shared_reach(&self, target: &Vertex) -> Option<Reach> {
        self.shared.contains(target).then_some(Reach::Shared)
    }

    /// node -> workload -> target
    fn via_workload(&self, node: &Vertex, target: &Vertex) -> Option<Reach> {
        self.targets_of(node, VertexKind::Workload)
            .find(|workload| self.has_edge(workload, target))
            .map(|workload| Reach::Path(vec![node.clone(), workload.clone(), target.clone()]))
    }

    /// node -> workload -> claim -> target
    fn via_claim(&self, node: &Vertex, target: &Vertex) -> Option<Reach> {
        for workload in self.targets_of(node, VertexKind::Workload) {
            if let Some(claim) = self
                .targets_of(workload, VertexKind::Claim)
                .find(|claim| self.has_edge(claim, target))
            {
                return Some(Reach::Path(vec![
                    node.clone(),
                    workload.clone(),
                    claim.clone(),
                    target.clone(),
                ]));
            }
        }
        None
    }

    /// node -> workload -> claim -> volume -> target
    fn via_volume(&self, node: &Vertex, target: &Vertex) -> Option<Reach> {
        for workload in self.targets_of(node, VertexKind::Workload) {
            for claim in self.targets_of(workload, VertexKind::Claim) {
                if let Some(volume) = self
                    .targets_of(claim, VertexKind::Volume)
                    .find(|volume| self.has_edge(volume, target))
                {
                    return Some(Reach::Path(vec![
                        node.clone(),
                        workload.clone(),
                        claim.clone(),
                        volume.clone(),
                        target.clone(),
                    ]));
                }
            }
        }
        None
    }
}

fn check_key(vertex: &Vertex) -> Result<()> {
    if vertex.is_well_formed() {
        Ok(())
    } else {
        Err(GraphError::MalformedKey(vertex.to_string()))
    }
}

/// Remove `to` from `map[from]`, dropping the set once empty.
fn detach(map: &mut HashMap<Vertex, HashSet<Vertex>>, from: &Vertex, to: &Vertex) -> bool {
    let Some(set) = map.get_mut(from) else {
        return false;
    };
    let removed = set.remove(to);
    if set.is_empty() {
        map.remove(from);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: Vertex, to: Vertex) -> Edge {
        Edge::infer(from, to).unwrap()
    }

    /// node0 -> pod0 -> {secret0, cm0, pvc0 -> pv0 -> secret-pv0}
    fn scenario() -> Graph {
        let mut g = Graph::new();
        let node = Vertex::node("node0");
        let pod = Vertex::workload("ns0", "pod0");
        let pvc = Vertex::claim("ns0", "pvc0");
        let pv = Vertex::volume("pv0");

        g.add_edge(&edge(node.clone(), pod.clone())).unwrap();
        g.add_edge(&edge(pod.clone(), Vertex::secret("ns0", "secret0"))).unwrap();
        g.add_edge(&edge(pod.clone(), Vertex::config_map("ns0", "cm0"))).unwrap();
        g.add_edge(&edge(pod.clone(), pvc.clone())).unwrap();
        g.add_edge(&edge(pvc, pv.clone())).unwrap();
        g.add_edge(&edge(pv, Vertex::secret("ns0", "secret-pv0"))).unwrap();
        g
    }

    #[test]
    fn test_add_edge_idempotent() {
        let mut g = Graph::new();
        let e = edge(Vertex::node("node0"), Vertex::workload("ns0", "pod0"));

        assert!(g.add_edge(&e).unwrap());
        assert!(!g.add_edge(&e).unwrap());
        assert_eq!(g.stats().edges, 1);
    }

    #[test]
    fn test_remove_absent_edge_is_noop() {
        let mut g = scenario();
        let before = g.stats();

        let absent = edge(Vertex::node("node9"), Vertex::workload("ns0", "pod9"));
        assert!(!g.remove_edge(&absent));
        assert_eq!(g.stats(), before);
    }

    #[test]
    fn test_edge_round_trip() {
        let mut g = Graph::new();
        let e = edge(Vertex::node("node0"), Vertex::attachment("att0"));

        assert!(!g.has_path("node0", &Vertex::attachment("att0")));
        g.add_edge(&e).unwrap();
        assert!(g.has_path("node0", &Vertex::attachment("att0")));
        g.remove_edge(&e);
        assert!(!g.has_path("node0", &Vertex::attachment("att0")));
        assert_eq!(g.stats(), GraphStats::default());
    }

    #[test]
    fn test_fixed_patterns() {
        let g = scenario();

        assert!(g.has_path("node0", &Vertex::secret("ns0", "secret0")));
        assert!(g.has_path("node0", &Vertex::config_map("ns0", "cm0")));
        assert!(g.has_path("node0", &Vertex::claim("ns0", "pvc0")));
        assert!(g.has_path("node0", &Vertex::volume("pv0")));
        assert!(g.has_path("node0", &Vertex::secret("ns0", "secret-pv0")));

        assert!(!g.has_path("node1", &Vertex::secret("ns0", "secret0")));
        assert!(!g.has_path("node0", &Vertex::secret("ns1", "secret0")));
    }

    #[test]
    fn test_volume_chain_does_not_reach_config_maps() {
        let mut g = scenario();
        // A config map hanging off a volume is not a supported shape, and
        // the relation set refuses to express it.
        assert!(Edge::infer(Vertex::volume("pv0"), Vertex::config_map("ns0", "x")).is_err());
        assert!(!g.has_path("node0", &Vertex::config_map("ns0", "x")));
        g.mark_shared(&Vertex::config_map("ns0", "x"), true).unwrap();
        assert!(g.has_path("node0", &Vertex::config_map("ns0", "x")));
    }

    #[test]
    fn test_shared_reachable_from_any_node() {
        let mut g = Graph::new();
        let shared = Vertex::secret("ns0", "secret0-shared");

        assert!(!g.has_path("unrelated", &shared));
        assert!(g.mark_shared(&shared, true).unwrap());
        assert_eq!(g.find_path("unrelated", &shared), Some(Reach::Shared));

        assert!(g.mark_shared(&shared, false).unwrap());
        assert!(!g.has_path("unrelated", &shared));
    }

    #[test]
    fn test_shared_flag_rejected_for_other_kinds() {
        let mut g = Graph::new();
        let err = g.mark_shared(&Vertex::volume("pv0"), true).unwrap_err();
        assert!(matches!(err, GraphError::NotShareable(VertexKind::Volume)));
    }

    #[test]
    fn test_remove_workload_cascades() {
        let mut g = scenario();
        let pod = Vertex::workload("ns0", "pod0");

        // node0->pod0 plus three outgoing edges.
        assert_eq!(g.remove_vertex(&pod), 4);
        assert!(!g.has_path("node0", &Vertex::secret("ns0", "secret0")));
        assert!(!g.contains_vertex(&pod));
        assert!(!g.contains_vertex(&Vertex::node("node0")));
        // The claim binding survives the workload.
        assert!(g.has_edge(&Vertex::claim("ns0", "pvc0"), &Vertex::volume("pv0")));
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut g = scenario();
        g.add_edge(&edge(Vertex::node("node0"), Vertex::attachment("att0")))
            .unwrap();

        assert_eq!(g.remove_vertex(&Vertex::node("node0")), 2);
        assert!(!g.has_path("node0", &Vertex::attachment("att0")));
        assert!(g.has_edge(
            &Vertex::workload("ns0", "pod0"),
            &Vertex::secret("ns0", "secret0")
        ));
    }

    #[test]
    fn test_malformed_keys() {
        let mut g = scenario();
        assert!(!g.has_path("", &Vertex::secret("ns0", "secret0")));
        assert!(!g.has_path("node0", &Vertex::secret("", "secret0")));

        let bad = edge(Vertex::node(""), Vertex::workload("ns0", "pod0"));
        assert!(matches!(g.add_edge(&bad), Err(GraphError::MalformedKey(_))));
    }

    #[test]
    fn test_path_witness() {
        let g = scenario();
        let reach = g.find_path("node0", &Vertex::volume("pv0")).unwrap();
        assert_eq!(
            reach.to_string(),
            "node:node0 -> workload:ns0/pod0 -> claim:ns0/pvc0 -> volume:pv0"
        );
    }

    #[test]
    fn test_edges_enumerates_everything() {
        let g = scenario();
        assert_eq!(g.edges().count(), g.stats().edges);
    }
}
