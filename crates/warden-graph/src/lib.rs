//! # Warden Graph
//!
//! The relationship graph behind node authorization, and the concurrent
//! store that shares it between the authorizer and the updater.
//!
//! ## Overview
//!
//! Edges run from nodes to the workloads scheduled on them, from workloads
//! to the secrets, config maps and claims they use, from claims to their
//! bound volumes, from volumes to the secrets they consume, and from nodes
//! to volume attachments. Reachability is answered only along these fixed
//! shapes; there is no general traversal.
//!
//! ## Key Types
//!
//! - [`Graph`] - Typed adjacency maps with cascade removal
//! - [`GraphStore`] - Concurrent wrapper with atomic rebuild
//! - [`Reachability`] - Read seam used by the authorizer
//! - [`GraphWriter`] - Write seam used by the updater
//! - [`GraphDigest`] - Order-independent digest for drift detection
//!
//! ## Usage
//!
//! ```rust
//! use warden_core::{Edge, Vertex};
//! use warden_graph::{GraphStore, GraphWriterExt, Reachability};
//!
//! let store = GraphStore::new();
//! let pod = Vertex::workload("ns0", "pod0");
//! store.add_edge(&Edge::infer(Vertex::node("node0"), pod.clone()).unwrap()).unwrap();
//! store.add_edge(&Edge::infer(pod, Vertex::secret("ns0", "secret0")).unwrap()).unwrap();
//!
//! assert!(store.has_path("node0", &Vertex::secret("ns0", "secret0")));
//! assert!(!store.has_path("node1", &Vertex::secret("ns0", "secret0")));
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent mutations**: adding a present edge or removing an absent
//!   one changes nothing
//! - **Misses are not errors**: malformed or unknown keys are unreachable
//! - **Atomic rebuild**: a full rebuild is published by one pointer swap

pub mod digest;
pub mod error;
pub mod graph;
pub mod store;
pub mod traits;

pub use digest::{compute_digest, GraphDigest, GraphSummary};
pub use error::{GraphError, Result};
pub use graph::{Graph, GraphStats, Reach};
pub use store::GraphStore;
pub use traits::{GraphWriter, GraphWriterExt, Reachability, RebuildOutcome};
