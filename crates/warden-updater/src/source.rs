//! Source abstractions for watch events and full snapshots.
//!
//! How notifications reach the updater is not its concern; any watch
//! client can sit behind these traits.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::events::WatchEvent;
use crate::objects::ClusterSnapshot;

/// Stream of watch events.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Receive the next event.
    ///
    /// Returns `None` once the source is closed.
    async fn next_event(&self) -> Result<Option<WatchEvent>>;

    /// Receive with timeout.
    ///
    /// Returns `Ok(None)` if the timeout expires first, and
    /// [`crate::UpdaterError::SourceClosed`] if the source is closed.
    async fn next_event_timeout(&self, timeout: Duration) -> Result<Option<WatchEvent>>;
}

/// Complete listings of current cluster objects, used by resync.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<ClusterSnapshot>;
}

/// In-memory sources for tests and embedding.
///
/// Events travel over a tokio channel; the snapshot is a shared value the
/// producer replaces as its view of the cluster changes.
pub mod memory {
    use super::*;
    use std::sync::Arc;

    use parking_lot::RwLock;
    use tokio::sync::{mpsc, Mutex};

    use crate::error::UpdaterError;

    /// Create a connected sink/source pair with the given capacity.
    pub fn channel(capacity: usize) -> (MemoryEventSink, MemoryEventSource) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            MemoryEventSink { sender: tx },
            MemoryEventSource {
                receiver: Mutex::new(rx),
            },
        )
    }

    /// Producer half of an in-memory event channel.
    #[derive(Clone)]
    pub struct MemoryEventSink {
        sender: mpsc::Sender<WatchEvent>,
    }

    impl MemoryEventSink {
        pub async fn send(&self, event: WatchEvent) -> Result<()> {
            self.sender
                .send(event)
                .await
                .map_err(|_| UpdaterError::SourceClosed)
        }
    }

    /// Consumer half of an in-memory event channel.
    pub struct MemoryEventSource {
        receiver: Mutex<mpsc::Receiver<WatchEvent>>,
    }

    #[async_trait]
    impl EventSource for MemoryEventSource {
        async fn next_event(&self) -> Result<Option<WatchEvent>> {
            let mut rx = self.receiver.lock().await;
            Ok(rx.recv().await)
        }

        async fn next_event_timeout(&self, timeout: Duration) -> Result<Option<WatchEvent>> {
            let mut rx = self.receiver.lock().await;
            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(event)) => Ok(Some(event)),
                Ok(None) => Err(UpdaterError::SourceClosed),
                Err(_) => Ok(None), // Timeout
            }
        }
    }

    /// Shared, replaceable snapshot.
    #[derive(Clone, Default)]
    pub struct MemorySnapshotSource {
        current: Arc<RwLock<ClusterSnapshot>>,
    }

    impl MemorySnapshotSource {
        pub fn new(snapshot: ClusterSnapshot) -> Self {
            Self {
                current: Arc::new(RwLock::new(snapshot)),
            }
        }

        pub fn set(&self, snapshot: ClusterSnapshot) {
            *self.current.write() = snapshot;
        }

        pub fn update(&self, f: impl FnOnce(&mut ClusterSnapshot)) {
            f(&mut *self.current.write());
        }
    }

    #[async_trait]
    impl SnapshotSource for MemorySnapshotSource {
        async fn snapshot(&self) -> Result<ClusterSnapshot> {
            Ok(self.current.read().clone())
        }
    }
}
