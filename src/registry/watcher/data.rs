use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use tracing::warn;

use crate::registry::Snapshot;
use crate::Codec;
use crate::Error;
use crate::ImportedListener;
use crate::RegistryError;
use crate::Result;
use crate::ServiceInstance;
use crate::StoreClient;

/// Per-instance data watch: caches the node's last decoded payload and turns
/// fired data events into `change`/`delete` callbacks.
pub(crate) struct DataWatcher {
    path: String,
    epoch: u64,
    current_epoch: Arc<AtomicU64>,
    store: Arc<dyn StoreClient>,
    codec: Arc<dyn Codec>,
    listener: Arc<dyn ImportedListener>,
    snapshot: Arc<Snapshot>,
    last: Mutex<ServiceInstance>,
}

impl DataWatcher {
    /// Read the node's current value, decode it, arm a one-shot data watch
    /// and cache the decoded value as last-known.
    ///
    /// Decode failure is fatal to this watcher instance: a corrupt payload
    /// means an incompatible publisher, so it is surfaced wrapped rather
    /// than swallowed.
    pub(crate) async fn arm(
        path: String,
        store: Arc<dyn StoreClient>,
        codec: Arc<dyn Codec>,
        listener: Arc<dyn ImportedListener>,
        snapshot: Arc<Snapshot>,
        current_epoch: Arc<AtomicU64>,
    ) -> Result<Arc<Self>> {
        let epoch = current_epoch.load(Ordering::Acquire);
        let bytes = store.get_data(&path, true).await?;
        let instance = decode(&codec, &path, &bytes)?;
        Ok(Arc::new(Self {
            path,
            epoch,
            current_epoch,
            store,
            codec,
            listener,
            snapshot,
            last: Mutex::new(instance),
        }))
    }

    pub(crate) fn last(&self) -> ServiceInstance {
        self.last.lock().clone()
    }

    /// True once a reset retired the session this watch was armed under.
    fn stale(&self) -> bool {
        self.epoch != self.current_epoch.load(Ordering::Acquire)
    }

    /// Fired data-changed: fetch the new value with the watch re-armed
    /// first, so a mutation racing the callback below fires again instead of
    /// being lost. The price is possible duplicate `change` delivery, which
    /// listeners tolerate.
    pub(crate) async fn on_data_changed(&self) -> Result<()> {
        if self.stale() {
            trace!("Stale data watch on {}, event discarded", self.path);
            return Ok(());
        }
        let bytes = self.store.get_data(&self.path, true).await?;
        let current = decode(&self.codec, &self.path, &bytes)?;
        let previous = self.last();
        if let Err(e) = self.listener.change(previous, current.clone()) {
            warn!("Change callback for {} failed: {}", self.path, e);
        }
        *self.last.lock() = current.clone();
        self.snapshot.put_instance(&self.path, current);
        Ok(())
    }

    /// Fired node-deleted: no rearm, the node is gone. Snapshot eviction is
    /// the idempotency gate shared with the children-diff delete route, so
    /// whichever route runs second is a no-op.
    pub(crate) fn on_deleted(&self) {
        if self.stale() {
            trace!("Stale data watch on {}, event discarded", self.path);
            return;
        }
        match self.snapshot.evict_instance(&self.path) {
            Some(instance) => {
                if let Err(e) = self.listener.delete(instance) {
                    warn!("Delete callback for {} failed: {}", self.path, e);
                }
            }
            None => trace!("Instance {} already evicted", self.path),
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &str {
        &self.path
    }
}

fn decode(
    codec: &Arc<dyn Codec>,
    path: &str,
    bytes: &[u8],
) -> Result<ServiceInstance> {
    codec.decode_instance(bytes).map_err(|e| {
        Error::Registry(RegistryError::IncompatiblePayload {
            path: path.to_string(),
            source: Box::new(e),
        })
    })
}
