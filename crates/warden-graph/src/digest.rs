//! Deterministic graph digests.
//!
//! Two graphs with the same edges, registrations and shared flags have the
//! same digest regardless of insertion order. Resync compares digests to
//! tell whether the incremental path had drifted.

use std::fmt;

use warden_core::{Edge, Vertex};

use crate::graph::{Graph, GraphStats};

const DIGEST_DOMAIN: &[u8] = b"warden-graph-v0:";

/// A 32-byte Blake3 digest of a graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphDigest(pub [u8; 32]);

impl GraphDigest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for GraphDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for GraphDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Stats and digest of a graph at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub stats: GraphStats,
    pub digest: GraphDigest,
}

impl GraphSummary {
    pub fn of(graph: &Graph) -> Self {
        Self {
            stats: graph.stats(),
            digest: compute_digest(graph),
        }
    }
}

/// Compute the digest of a graph.
///
/// Algorithm:
/// 1. Collect edges, registrations and shared flags; sort each
/// 2. Hash: H = Blake3(domain || section tag || count || entries...)
///
/// Every vertex is framed as its kind tag followed by its key parts, each
/// length-prefixed, so keys containing separators cannot collide.
pub fn compute_digest(graph: &Graph) -> GraphDigest {
    let mut edges: Vec<Edge> = graph.edges().collect();
    edges.sort();
    let mut registered: Vec<&Vertex> = graph.registered().collect();
    registered.sort();
    let mut shared: Vec<&Vertex> = graph.shared().collect();
    shared.sort();

    let mut hasher = blake3::Hasher::new();
    hasher.update(DIGEST_DOMAIN);

    hasher.update(b"edges");
    hasher.update(&(edges.len() as u64).to_le_bytes());
    for edge in &edges {
        hash_vertex(&mut hasher, edge.from());
        hash_vertex(&mut hasher, edge.to());
        hash_part(&mut hasher, &edge.relation().to_string());
    }

    hasher.update(b"registered");
    hasher.update(&(registered.len() as u64).to_le_bytes());
    for vertex in registered {
        hash_vertex(&mut hasher, vertex);
    }

    hasher.update(b"shared");
    hasher.update(&(shared.len() as u64).to_le_bytes());
    for vertex in shared {
        hash_vertex(&mut hasher, vertex);
    }

    GraphDigest(*hasher.finalize().as_bytes())
}

fn hash_vertex(hasher: &mut blake3::Hasher, vertex: &Vertex) {
    hash_part(hasher, vertex.kind().as_str());
    match vertex {
        Vertex::Node(name) | Vertex::Volume(name) | Vertex::Attachment(name) => {
            hash_part(hasher, name);
        }
        Vertex::Workload(key) | Vertex::Secret(key) | Vertex::ConfigMap(key) | Vertex::Claim(key) => {
            hash_part(hasher, &key.namespace);
            hash_part(hasher, &key.name);
        }
    }
}

fn hash_part(hasher: &mut blake3::Hasher, part: &str) {
    hasher.update(&(part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_order_independent() {
        let a = Edge::infer(Vertex::node("node0"), Vertex::workload("ns0", "pod0")).unwrap();
        let b = Edge::infer(Vertex::workload("ns0", "pod0"), Vertex::secret("ns0", "s0")).unwrap();

        let mut g1 = Graph::new();
        g1.add_edge(&a).unwrap();
        g1.add_edge(&b).unwrap();

        let mut g2 = Graph::new();
        g2.add_edge(&b).unwrap();
        g2.add_edge(&a).unwrap();

        assert_eq!(compute_digest(&g1), compute_digest(&g2));
    }

    #[test]
    fn test_digest_sees_shared_flag() {
        let mut g = Graph::new();
        let before = compute_digest(&g);
        g.mark_shared(&Vertex::secret("ns0", "s0"), true).unwrap();
        assert_ne!(before, compute_digest(&g));
    }

    #[test]
    fn test_digest_separates_key_parts() {
        let mut g1 = Graph::new();
        g1.register(Vertex::secret("a/b", "c")).unwrap();
        let mut g2 = Graph::new();
        g2.register(Vertex::secret("a", "b/c")).unwrap();

        assert_eq!(Vertex::secret("a/b", "c").to_string(), Vertex::secret("a", "b/c").to_string());
        assert_ne!(compute_digest(&g1), compute_digest(&g2));
    }

    #[test]
    fn test_digest_separates_sections() {
        let secret = Vertex::secret("ns0", "s0");
        let mut registered = Graph::new();
        registered.register(secret.clone()).unwrap();
        let mut shared = Graph::new();
        shared.mark_shared(&secret, true).unwrap();

        assert_ne!(compute_digest(&registered), compute_digest(&shared));
    }

    #[test]
    fn test_digest_display() {
        let digest = GraphDigest([0xab; 32]);
        assert_eq!(digest.to_string(), "abababababababab");
    }
}
