//! # Warden Updater
//!
//! Keeps the relationship graph consistent with cluster state.
//!
//! ## Overview
//!
//! The updater consumes lifecycle events for the objects that take part in
//! relationships and translates each into one write section on the graph.
//! Event delivery is assumed unreliable, so a periodic full resync rebuilds
//! the graph from a snapshot and swaps it in atomically. Resync is the
//! source of truth; incremental updates only cut latency.
//!
//! ## Key Properties
//!
//! - **Idempotent**: Re-delivering an event leaves the graph unchanged
//! - **Diff-based**: An updated object's edges are recomputed from scratch
//! - **Non-fatal**: Inconsistent events are logged, counted and skipped
//! - **Self-healing**: Resync repairs anything the event path missed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_graph::GraphStore;
//! use warden_updater::{memory, GraphUpdater, UpdaterConfig};
//!
//! async fn example() {
//!     let store = Arc::new(GraphStore::new());
//!     let config = UpdaterConfig::default();
//!
//!     let (_sink, events) = memory::channel(config.event_channel_capacity);
//!     let snapshots = memory::MemorySnapshotSource::default();
//!     let (_shutdown, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let updater = GraphUpdater::new(store, config);
//!     updater.run(&events, &snapshots, shutdown_rx).await.unwrap();
//! }
//! ```
//!
//! ## Event Mapping
//!
//! ```text
//! Pod added/modified     -> Node->Workload, Workload->{Secret,ConfigMap,Claim}
//! Claim added/modified   -> Claim->Volume (removed when the binding clears)
//! Volume added/modified  -> Volume->Secret
//! Node added/modified    -> Node->Attachment, from the node's attachment list
//! Attachment added       -> Node->Attachment, from the node it names
//! Secret/ConfigMap       -> registration and shared flag
//! Any deleted            -> vertex removed with every edge touching it
//! ```

mod link;

pub mod error;
pub mod events;
pub mod objects;
pub mod source;
pub mod updater;

pub use error::{Result, UpdaterError};
pub use events::WatchEvent;
pub use objects::{
    AttachmentObject, ClaimObject, ClusterObject, ClusterSnapshot, NodeObject, PodObject,
    SharedObject, VolumeObject,
};
pub use source::{memory, EventSource, SnapshotSource};
pub use updater::{GraphUpdater, ResyncReport, UpdaterConfig, UpdaterStats};
