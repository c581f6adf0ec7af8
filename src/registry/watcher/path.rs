use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::DataWatcher;
use super::WatchTable;
use super::Watcher;
use crate::registry::DiffContainer;
use crate::registry::Snapshot;
use crate::Codec;
use crate::ImportedListener;
use crate::Result;
use crate::Service;
use crate::StoreClient;

/// Per-service children watch: observes the instance list under one service
/// path and reconciles every fire against the previously observed list.
///
/// The full diff is re-derived on every fire rather than trusting an
/// incremental event: the store coalesces a batch of changes into a single
/// fire, and the rearm gap can miss individual notifications, so the diff is
/// what self-heals the local view.
pub(crate) struct PathWatcher {
    service: Service,
    path: String,
    epoch: u64,
    current_epoch: Arc<AtomicU64>,
    store: Arc<dyn StoreClient>,
    codec: Arc<dyn Codec>,
    listener: Arc<dyn ImportedListener>,
    snapshot: Arc<Snapshot>,
    table: Arc<WatchTable>,
    /// Sorted child names observed at the last completed reconciliation
    previous: Mutex<Vec<String>>,
}

impl PathWatcher {
    /// Read the full child list under `path`, sorted, and arm a one-shot
    /// children watch. A missing root surfaces as `NoNode` for the caller to
    /// classify.
    pub(crate) async fn arm(
        service: Service,
        path: String,
        store: Arc<dyn StoreClient>,
        codec: Arc<dyn Codec>,
        listener: Arc<dyn ImportedListener>,
        snapshot: Arc<Snapshot>,
        table: Arc<WatchTable>,
        current_epoch: Arc<AtomicU64>,
    ) -> Result<Arc<Self>> {
        let epoch = current_epoch.load(Ordering::Acquire);
        let mut children = store.get_children(&path, true).await?;
        children.sort();
        Ok(Arc::new(Self {
            service,
            path,
            epoch,
            current_epoch,
            store,
            codec,
            listener,
            snapshot,
            table,
            previous: Mutex::new(children),
        }))
    }

    /// Bring up one data watcher per child discovered at arm time. Failures
    /// are isolated per child: one bad node never blocks its siblings.
    pub(crate) async fn seed(&self) {
        info!("Watch service: {:?} at {}", self.service, self.path);
        let children = self.previous.lock().clone();
        for child in children {
            if let Err(e) = self.init_child(&child).await {
                info!("Skip instance {}/{}: {}", self.path, child, e);
            }
        }
    }

    fn stale(&self) -> bool {
        self.epoch != self.current_epoch.load(Ordering::Acquire)
    }

    /// Fired children-changed: re-arm first, then reconcile the fresh list
    /// against the previous one. The previous list is replaced only after
    /// processing completes.
    pub(crate) async fn on_children_changed(&self) -> Result<()> {
        if self.stale() {
            trace!("Stale children watch on {}, event discarded", self.path);
            return Ok(());
        }
        let mut current = self.store.get_children(&self.path, true).await?;
        current.sort();

        let previous = self.previous.lock().clone();
        let container = DiffContainer::new(&previous, &current);
        for child in container.added() {
            if let Err(e) = self.init_child(child).await {
                error!("Skip instance {}/{}: {}", self.path, child, e);
            }
        }
        // Same outcome as the data watcher's own delete notification; this
        // route also recovers entries that notification missed.
        for child in container.deleted() {
            self.evict_child(child);
        }
        *self.previous.lock() = current;
        Ok(())
    }

    async fn init_child(
        &self,
        child: &str,
    ) -> Result<()> {
        let actual = format!("{}/{}", self.path, child);
        let watcher = DataWatcher::arm(
            actual.clone(),
            self.store.clone(),
            self.codec.clone(),
            self.listener.clone(),
            self.snapshot.clone(),
            self.current_epoch.clone(),
        )
        .await?;
        let instance = watcher.last();
        self.table.insert(actual.clone(), Watcher::Data(watcher));
        info!("Reconfig and add instance: {} ({:?})", actual, instance.host);
        if let Err(e) = self.listener.add(instance.clone()) {
            warn!("Add callback for {} failed: {}", actual, e);
        }
        self.snapshot.put_instance(actual, instance);
        Ok(())
    }

    fn evict_child(
        &self,
        child: &str,
    ) {
        let actual = format!("{}/{}", self.path, child);
        self.table.remove(&actual);
        match self.snapshot.evict_instance(&actual) {
            Some(instance) => {
                info!("Reconfig and delete instance: {} ({:?})", actual, instance.host);
                if let Err(e) = self.listener.delete(instance) {
                    warn!("Delete callback for {} failed: {}", actual, e);
                }
            }
            None => trace!("Instance {} already evicted", actual),
        }
    }

    #[cfg(test)]
    pub(crate) fn children(&self) -> Vec<String> {
        self.previous.lock().clone()
    }

    #[cfg(test)]
    pub(crate) fn service(&self) -> &Service {
        &self.service
    }
}
