//! Concurrent graph store.
//!
//! The live graph sits behind an `ArcSwap<RwLock<Graph>>`:
//!
//! - Readers load the current pointer and take a shared lock.
//! - Incremental writers serialize on `writer`, then take the exclusive
//!   lock on the current graph for one logical update.
//! - A rebuild serializes on `writer`, builds a fresh graph off to the
//!   side, and publishes it with a single pointer store. Readers still
//!   holding the old pointer finish against the old graph.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};

use warden_core::Vertex;

use crate::digest::{compute_digest, GraphDigest, GraphSummary};
use crate::graph::{Graph, GraphStats, Reach};
use crate::traits::{GraphWriter, Reachability, RebuildOutcome};

/// Thread-safe relationship graph shared by the authorizer and updater.
pub struct GraphStore {
    current: ArcSwap<RwLock<Graph>>,
    writer: Mutex<()>,
}

impl GraphStore {
    /// Create a store holding an empty graph.
    pub fn new() -> Self {
        Self::from_graph(Graph::new())
    }

    /// Create a store holding `graph`.
    pub fn from_graph(graph: Graph) -> Self {
        Self {
            current: ArcSwap::from_pointee(RwLock::new(graph)),
            writer: Mutex::new(()),
        }
    }

    /// Copy of the current graph.
    pub fn snapshot(&self) -> Graph {
        self.current.load().read().clone()
    }

    /// Run `f` against the current graph under a shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        let cell = self.current.load();
        let graph = cell.read();
        f(&*graph)
    }

    pub fn stats(&self) -> GraphStats {
        self.read(Graph::stats)
    }

    pub fn digest(&self) -> GraphDigest {
        self.read(compute_digest)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Reachability for GraphStore {
    fn find_path(&self, node_name: &str, target: &Vertex) -> Option<Reach> {
        self.read(|g| g.find_path(node_name, target))
    }
}

impl GraphWriter for GraphStore {
    fn update<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        let _writer = self.writer.lock();
        let cell = self.current.load_full();
        let mut graph = cell.write();
        f(&mut *graph)
    }

    fn rebuild(&self, build: impl FnOnce(&Graph) -> Graph) -> RebuildOutcome {
        let _writer = self.writer.lock();
        let previous = self.current.load_full();

        // Readers keep going on `previous`; only writers are held off.
        let (before, next) = {
            let graph = previous.read();
            (GraphSummary::of(&graph), build(&*graph))
        };
        let after = GraphSummary::of(&next);

        self.current.store(Arc::new(RwLock::new(next)));
        RebuildOutcome { before, after }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::GraphWriterExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use warden_core::Edge;

    fn pod_edges(node: &str, pod: &str, secret: &str) -> [Edge; 2] {
        let workload = Vertex::workload("ns0", pod);
        [
            Edge::infer(Vertex::node(node), workload.clone()).unwrap(),
            Edge::infer(workload, Vertex::secret("ns0", secret)).unwrap(),
        ]
    }

    #[test]
    fn test_store_basic() {
        let store = GraphStore::new();
        for edge in pod_edges("node0", "pod0", "secret0") {
            assert!(store.add_edge(&edge).unwrap());
        }

        assert!(store.has_path("node0", &Vertex::secret("ns0", "secret0")));
        assert_eq!(store.stats().edges, 2);
    }

    #[test]
    fn test_rebuild_swaps_whole_graph() {
        let store = GraphStore::new();
        for edge in pod_edges("node0", "pod0", "old") {
            store.add_edge(&edge).unwrap();
        }

        let outcome = store.rebuild(|_| {
            let mut g = Graph::new();
            for edge in pod_edges("node0", "pod0", "new") {
                g.add_edge(&edge).unwrap();
            }
            g
        });

        assert!(outcome.drifted());
        assert!(!store.has_path("node0", &Vertex::secret("ns0", "old")));
        assert!(store.has_path("node0", &Vertex::secret("ns0", "new")));
    }

    #[test]
    fn test_rebuild_without_change_reports_no_drift() {
        let store = GraphStore::new();
        for edge in pod_edges("node0", "pod0", "secret0") {
            store.add_edge(&edge).unwrap();
        }
        let outcome = store.rebuild(|g| g.clone());
        assert!(!outcome.drifted());
        assert_eq!(outcome.before.stats, outcome.after.stats);
    }

    #[test]
    fn test_readers_never_see_torn_updates() {
        let store = Arc::new(GraphStore::new());
        let done = Arc::new(AtomicBool::new(false));
        let secret = Vertex::secret("ns0", "secret0");

        // Each update adds or removes both hops together, so a reader
        // may only ever see "node reaches workload" and "workload reaches
        // secret" in the same state.
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        store.read(|g| {
                            let scheduled = g.has_edge(
                                &Vertex::node("node0"),
                                &Vertex::workload("ns0", "pod0"),
                            );
                            let referenced = g.has_edge(
                                &Vertex::workload("ns0", "pod0"),
                                &Vertex::secret("ns0", "secret0"),
                            );
                            assert_eq!(scheduled, referenced);
                        });
                    }
                })
            })
            .collect();

        for i in 0..500 {
            if i % 10 == 0 {
                store.rebuild(|g| g.clone());
            }
            store.update(|g| {
                for edge in pod_edges("node0", "pod0", "secret0") {
                    if i % 2 == 0 {
                        g.add_edge(&edge).unwrap();
                    } else {
                        g.remove_edge(&edge);
                    }
                }
            });
        }

        done.store(true, Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
        assert!(!store.has_path("node0", &secret));
    }
}
