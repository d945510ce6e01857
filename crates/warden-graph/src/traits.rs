//! Graph traits: the read and write seams around the relationship graph.
//!
//! The authorizer depends only on [`Reachability`]; the updater depends on
//! [`GraphWriter`]. [`crate::GraphStore`] implements both.

use warden_core::{Edge, Vertex};

use crate::digest::GraphSummary;
use crate::error::Result;
use crate::graph::{Graph, Reach};

/// Read side: bounded reachability queries.
///
/// Implementations must never fail; a miss of any kind is `None`.
pub trait Reachability: Send + Sync {
    /// Find how `node_name` reaches `target` along the fixed patterns.
    fn find_path(&self, node_name: &str, target: &Vertex) -> Option<Reach>;

    /// Whether `node_name` reaches `target`.
    fn has_path(&self, node_name: &str, target: &Vertex) -> bool {
        self.find_path(node_name, target).is_some()
    }
}

impl Reachability for Graph {
    fn find_path(&self, node_name: &str, target: &Vertex) -> Option<Reach> {
        Graph::find_path(self, node_name, target)
    }
}

/// Before/after summaries of a full rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub before: GraphSummary,
    pub after: GraphSummary,
}

impl RebuildOutcome {
    /// Whether the rebuilt graph differs from the one it replaced.
    pub fn drifted(&self) -> bool {
        self.before.digest != self.after.digest
    }
}

/// Write side: transactional mutation and atomic replacement.
///
/// # Design Notes
///
/// - **Single write section**: everything done inside one [`update`] call
///   becomes visible to readers at once.
/// - **Atomic rebuild**: [`rebuild`] publishes a complete new graph with a
///   single pointer swap; readers see the old graph or the new one.
///
/// [`update`]: GraphWriter::update
/// [`rebuild`]: GraphWriter::rebuild
pub trait GraphWriter: Send + Sync {
    /// Apply `f` to the live graph under the write lock.
    fn update<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R;

    /// Build a replacement graph and swap it in.
    ///
    /// `build` receives the current graph for reference; incremental
    /// writers are held off until the swap completes.
    fn rebuild(&self, build: impl FnOnce(&Graph) -> Graph) -> RebuildOutcome;
}

/// Extension trait with one-call mutations.
pub trait GraphWriterExt: GraphWriter {
    fn add_edge(&self, edge: &Edge) -> Result<bool> {
        self.update(|g| g.add_edge(edge))
    }

    fn remove_edge(&self, edge: &Edge) -> bool {
        self.update(|g| g.remove_edge(edge))
    }

    fn remove_vertex(&self, vertex: &Vertex) -> usize {
        self.update(|g| g.remove_vertex(vertex))
    }

    fn mark_shared(&self, vertex: &Vertex, shared: bool) -> Result<bool> {
        self.update(|g| g.mark_shared(vertex, shared))
    }
}

impl<W: GraphWriter + ?Sized> GraphWriterExt for W {}
