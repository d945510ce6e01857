//! The graph updater: incremental event application and full resync.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use warden_graph::{Graph, GraphWriter, RebuildOutcome};

use crate::error::{Result, UpdaterError};
use crate::events::WatchEvent;
use crate::link::Linker;
use crate::objects::{ClusterObject, ClusterSnapshot};
use crate::source::{EventSource, SnapshotSource};

/// Configuration for updater behavior.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// How often to rebuild the graph from a full snapshot.
    pub resync_interval: Duration,
    /// Upper bound on a single wait for the next event.
    pub event_timeout: Duration,
    /// Timeout for fetching a snapshot.
    pub snapshot_timeout: Duration,
    /// Capacity of in-memory event channels.
    pub event_channel_capacity: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            resync_interval: Duration::from_secs(300),
            event_timeout: Duration::from_secs(30),
            snapshot_timeout: Duration::from_secs(60),
            event_channel_capacity: 1024,
        }
    }
}

/// Counters describing updater activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdaterStats {
    pub events_applied: u64,
    pub events_failed: u64,
    /// Edges dropped because an endpoint had not been observed.
    pub edges_skipped: u64,
    pub resyncs: u64,
    /// Resyncs whose rebuilt graph differed from the live one.
    pub drifted_resyncs: u64,
}

#[derive(Default)]
struct Counters {
    events_applied: AtomicU64,
    events_failed: AtomicU64,
    edges_skipped: AtomicU64,
    resyncs: AtomicU64,
    drifted_resyncs: AtomicU64,
}

/// Result of a full resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResyncReport {
    /// Objects in the snapshot.
    pub objects: usize,
    /// Objects rejected outright (malformed keys).
    pub rejected_objects: usize,
    /// Edges dropped because an endpoint was missing from the snapshot.
    pub edges_skipped: u64,
    pub outcome: RebuildOutcome,
}

impl ResyncReport {
    /// Whether the incremental path had drifted from the snapshot.
    pub fn drifted(&self) -> bool {
        self.outcome.drifted()
    }
}

/// Keeps a graph consistent with cluster state.
pub struct GraphUpdater<W: GraphWriter> {
    writer: Arc<W>,
    config: UpdaterConfig,
    counters: Counters,
}

impl<W: GraphWriter> GraphUpdater<W> {
    /// Create a new updater writing to `writer`.
    pub fn new(writer: Arc<W>, config: UpdaterConfig) -> Self {
        Self {
            writer,
            config,
            counters: Counters::default(),
        }
    }

    pub fn writer(&self) -> &Arc<W> {
        &self.writer
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn stats(&self) -> UpdaterStats {
        let c = &self.counters;
        UpdaterStats {
            events_applied: c.events_applied.load(Ordering::Relaxed),
            events_failed: c.events_failed.load(Ordering::Relaxed),
            edges_skipped: c.edges_skipped.load(Ordering::Relaxed),
            resyncs: c.resyncs.load(Ordering::Relaxed),
            drifted_resyncs: c.drifted_resyncs.load(Ordering::Relaxed),
        }
    }

    /// Apply one watch event.
    ///
    /// The whole event is one write section: readers see the object's
    /// edges either entirely before or entirely after the change.
    pub fn apply(&self, event: &WatchEvent) -> Result<()> {
        let object = event.object();

        let (result, skipped) = self.writer.update(|graph| {
            let mut linker = Linker::new();
            let result = match event {
                WatchEvent::Deleted(_) => {
                    graph.remove_vertex(&object.vertex());
                    Ok(())
                }
                WatchEvent::Added(_) | WatchEvent::Modified(_) => linker
                    .register(graph, object)
                    .and_then(|()| linker.link(graph, object)),
            };
            (result, linker.skipped)
        });

        self.counters
            .edges_skipped
            .fetch_add(skipped, Ordering::Relaxed);

        match &result {
            Ok(()) => {
                self.counters.events_applied.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Applied {} event for {}", event.type_name(), object.vertex());
            }
            Err(e) => {
                self.counters.events_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Failed to apply {} event for {}: {}",
                    event.type_name(),
                    object.vertex(),
                    e
                );
            }
        }
        result
    }

    /// Rebuild the graph from a complete snapshot and swap it in.
    ///
    /// Malformed objects are logged and left out; they never abort the
    /// rebuild.
    pub fn resync(&self, snapshot: &ClusterSnapshot) -> ResyncReport {
        let mut rejected = 0;
        let mut skipped = 0;

        let outcome = self.writer.rebuild(|_| {
            let mut graph = Graph::new();
            let mut linker = Linker::new();

            for object in &snapshot.objects {
                if let Err(e) = linker.register(&mut graph, object) {
                    rejected += 1;
                    tracing::warn!("Resync rejected {}: {}", object.vertex(), e);
                }
            }
            // Attachments link last so a node's own list never drops the
            // edge an attachment object asserts.
            let (attachments, others): (Vec<_>, Vec<_>) = snapshot
                .objects
                .iter()
                .partition(|o| matches!(o, ClusterObject::Attachment(_)));
            for object in others.into_iter().chain(attachments) {
                if !graph.is_registered(&object.vertex()) {
                    continue;
                }
                if let Err(e) = linker.link(&mut graph, object) {
                    rejected += 1;
                    tracing::warn!("Resync failed to link {}: {}", object.vertex(), e);
                }
            }

            skipped = linker.skipped;
            graph
        });

        let report = ResyncReport {
            objects: snapshot.len(),
            rejected_objects: rejected,
            edges_skipped: skipped,
            outcome,
        };

        self.counters.resyncs.fetch_add(1, Ordering::Relaxed);
        self.counters
            .edges_skipped
            .fetch_add(skipped, Ordering::Relaxed);

        let (before, after) = (&report.outcome.before, &report.outcome.after);
        if report.drifted() {
            self.counters.drifted_resyncs.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Resync corrected drift: edges {} -> {}, vertices {} -> {}, digest {} -> {}",
                before.stats.edges,
                after.stats.edges,
                before.stats.vertices,
                after.stats.vertices,
                before.digest,
                after.digest
            );
        } else {
            tracing::info!(
                "Resync complete: {} objects, {} edges, digest {}",
                report.objects,
                after.stats.edges,
                after.digest
            );
        }
        report
    }

    /// Fetch a snapshot from `source` and resync from it.
    pub async fn resync_from<S: SnapshotSource + ?Sized>(&self, source: &S) -> Result<ResyncReport> {
        let snapshot = tokio::time::timeout(self.config.snapshot_timeout, source.snapshot())
            .await
            .map_err(|_| UpdaterError::Timeout("waiting for snapshot".into()))??;
        Ok(self.resync(&snapshot))
    }

    /// Run until shutdown or until the event source closes.
    ///
    /// Resyncs once before reading any event, then every
    /// `resync_interval`. Failed events and failed resyncs are logged and
    /// the loop carries on; the live graph is never cleared because a
    /// snapshot could not be read.
    pub async fn run<E, S>(
        &self,
        events: &E,
        snapshots: &S,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()>
    where
        E: EventSource + ?Sized,
        S: SnapshotSource + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.config.resync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Graph updater started (resync every {:?})",
            self.config.resync_interval
        );

        // List, then watch: events queued before startup land on top of
        // the initial snapshot rather than being replaced by it.
        if let Err(e) = self.resync_from(snapshots).await {
            tracing::warn!("Initial resync skipped: {}", e);
        }
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Graph updater shutting down");
                        return Ok(());
                    }
                }

                _ = ticker.tick() => {
                    if let Err(e) = self.resync_from(snapshots).await {
                        tracing::warn!("Resync skipped: {}", e);
                    }
                }

                next = events.next_event_timeout(self.config.event_timeout) => {
                    match next {
                        // Failures are counted and logged by `apply`.
                        Ok(Some(event)) => {
                            let _ = self.apply(&event);
                        }
                        Ok(None) => {}
                        Err(UpdaterError::SourceClosed) => {
                            tracing::info!("Event source closed, graph updater stopping");
                            return Ok(());
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{
        AttachmentObject, ClaimObject, NodeObject, PodObject, SharedObject, VolumeObject,
    };
    use crate::source::memory::{channel, MemorySnapshotSource};
    use warden_core::Vertex;
    use warden_graph::{GraphStore, Reachability};

    fn updater() -> GraphUpdater<GraphStore> {
        GraphUpdater::new(Arc::new(GraphStore::new()), UpdaterConfig::default())
    }

    fn snapshot() -> ClusterSnapshot {
        ClusterSnapshot::new()
            .with(NodeObject::new("node0"))
            .with(ClusterObject::Secret(SharedObject::new("ns0", "s0")))
            .with(ClusterObject::Secret(SharedObject::new("ns0", "shared").shared()))
            .with(ClusterObject::Secret(SharedObject::new("ns0", "pv-secret")))
            .with(VolumeObject::new("pv0").with_secret("ns0", "pv-secret"))
            .with(ClaimObject::new("ns0", "pvc0").bound_to("pv0"))
            .with(
                PodObject::new("ns0", "pod0")
                    .on_node("node0")
                    .with_secret("s0")
                    .with_claim("pvc0"),
            )
    }

    #[test]
    fn test_apply_add_and_delete() {
        let updater = updater();
        for object in snapshot().objects {
            updater.apply(&WatchEvent::Added(object)).unwrap();
        }

        let store = updater.writer();
        assert!(store.has_path("node0", &Vertex::secret("ns0", "s0")));
        assert!(store.has_path("node0", &Vertex::volume("pv0")));
        assert!(store.has_path("node0", &Vertex::secret("ns0", "pv-secret")));
        assert!(store.has_path("node9", &Vertex::secret("ns0", "shared")));

        updater
            .apply(&WatchEvent::Deleted(PodObject::new("ns0", "pod0").into()))
            .unwrap();
        assert!(!store.has_path("node0", &Vertex::secret("ns0", "s0")));
        assert!(!store.has_path("node0", &Vertex::volume("pv0")));

        let stats = updater.stats();
        assert_eq!(stats.events_applied, 8);
        assert_eq!(stats.edges_skipped, 0);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let updater = updater();
        for object in snapshot().objects {
            updater.apply(&WatchEvent::Added(object)).unwrap();
        }
        let before = updater.writer().digest();

        for object in snapshot().objects {
            updater.apply(&WatchEvent::Modified(object)).unwrap();
        }
        assert_eq!(updater.writer().digest(), before);
    }

    #[test]
    fn test_out_of_order_events_are_skipped_then_repaired() {
        let updater = updater();
        updater
            .apply(&WatchEvent::Added(
                PodObject::new("ns0", "pod0").on_node("node0").with_secret("s0").into(),
            ))
            .unwrap();
        assert_eq!(updater.stats().edges_skipped, 2);

        let report = updater.resync(&snapshot());
        assert!(report.drifted());
        assert!(updater
            .writer()
            .has_path("node0", &Vertex::secret("ns0", "s0")));
        assert_eq!(updater.stats().drifted_resyncs, 1);
    }

    #[test]
    fn test_resync_matches_incremental() {
        let incremental = updater();
        for object in snapshot().objects {
            incremental.apply(&WatchEvent::Added(object)).unwrap();
        }

        let report = incremental.resync(&snapshot());
        assert!(!report.drifted());
        assert_eq!(report.objects, 7);
        assert_eq!(report.rejected_objects, 0);
    }

    #[test]
    fn test_resync_reports_drift_between_lookalike_keys() {
        let updater = updater();
        let before = ClusterSnapshot::new().with(ClusterObject::Secret(SharedObject::new("a/b", "c")));
        let after = ClusterSnapshot::new().with(ClusterObject::Secret(SharedObject::new("a", "b/c")));

        updater.resync(&before);
        assert!(updater.resync(&after).drifted());
    }

    #[test]
    fn test_resync_rejects_malformed_objects() {
        let updater = updater();
        let snap = snapshot().with(NodeObject::new(""));
        let report = updater.resync(&snap);

        assert_eq!(report.rejected_objects, 1);
        assert!(updater
            .writer()
            .has_path("node0", &Vertex::secret("ns0", "s0")));
    }

    #[test]
    fn test_apply_malformed_object_fails() {
        let updater = updater();
        let err = updater
            .apply(&WatchEvent::Added(PodObject::new("", "pod0").into()))
            .unwrap_err();
        assert!(matches!(err, UpdaterError::Graph(_)));
        assert_eq!(updater.stats().events_failed, 1);
    }

    #[test]
    fn test_attachment_edges_kept_regardless_of_gate() {
        let updater = updater();
        let snap = ClusterSnapshot::new()
            .with(AttachmentObject::new("att0", "node0", "pv0"))
            .with(NodeObject::new("node0").with_attachment("att0"));

        updater.resync(&snap);
        assert!(updater
            .writer()
            .has_path("node0", &Vertex::attachment("att0")));
    }

    #[test]
    fn test_attachment_links_to_its_node() {
        let updater = updater();
        updater
            .apply(&WatchEvent::Added(NodeObject::new("node0").into()))
            .unwrap();
        updater
            .apply(&WatchEvent::Added(
                AttachmentObject::new("att0", "node0", "pv0").into(),
            ))
            .unwrap();

        let target = Vertex::attachment("att0");
        assert!(updater.writer().has_path("node0", &target));

        // The resync graph agrees even though the node does not list it.
        let snap = ClusterSnapshot::new()
            .with(AttachmentObject::new("att0", "node0", "pv0"))
            .with(NodeObject::new("node0"));
        assert!(!updater.resync(&snap).drifted());
        assert!(updater.writer().has_path("node0", &target));
    }

    #[test]
    fn test_attachment_before_node_is_skipped() {
        let updater = updater();
        updater
            .apply(&WatchEvent::Added(
                AttachmentObject::new("att0", "node0", "pv0").into(),
            ))
            .unwrap();
        assert_eq!(updater.stats().edges_skipped, 1);
    }

    #[tokio::test]
    async fn test_run_applies_events_until_shutdown() {
        let updater = Arc::new(updater());
        let (sink, source) = channel(updater.config().event_channel_capacity);
        let snapshots = MemorySnapshotSource::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Queued before the loop starts; the initial (empty) resync must
        // not erase them.
        for object in snapshot().objects {
            sink.send(WatchEvent::Added(object)).await.unwrap();
        }

        let task = {
            let updater = Arc::clone(&updater);
            tokio::spawn(async move { updater.run(&source, &snapshots, shutdown_rx).await })
        };

        let target = Vertex::secret("ns0", "s0");
        for _ in 0..100 {
            if updater.writer().has_path("node0", &target) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(updater.writer().has_path("node0", &target));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap().unwrap();
        let stats = updater.stats();
        assert_eq!(stats.resyncs, 1);
        assert_eq!(stats.events_applied, 7);
    }

    #[tokio::test]
    async fn test_run_stops_when_source_closes() {
        let updater = updater();
        let (sink, source) = channel(4);
        let snapshots = MemorySnapshotSource::new(snapshot());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        drop(sink);
        updater.run(&source, &snapshots, shutdown_rx).await.unwrap();
    }
}
