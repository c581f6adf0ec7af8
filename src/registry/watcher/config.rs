use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::WatchTable;
use super::Watcher;
use crate::registry::Exports;
use crate::registry::Roadmap;
use crate::Codec;
use crate::ConfigOverrides;
use crate::CreateMode;
use crate::Result;
use crate::StoreClient;

/// Publishes this process's configuration-override node and owns the
/// republish cycle the watcher below triggers.
///
/// Republish state (debounce clock, pending flag) lives here rather than on
/// the watcher because each cycle retires the old watcher and installs a
/// fresh one on the new node.
pub(crate) struct ConfigPublisher {
    store: Arc<dyn StoreClient>,
    codec: Arc<dyn Codec>,
    overrides: Arc<ConfigOverrides>,
    exports: Arc<Exports>,
    table: Arc<WatchTable>,
    current_epoch: Arc<AtomicU64>,

    /// `{root}/_configs`
    dir: String,
    sid: String,

    /// Minimum interval between republish cycles; a burst of peer updates
    /// coalesces into one deferred cycle instead of a notification storm
    debounce: Duration,
    last_republish: Mutex<Option<Instant>>,
    republish_pending: AtomicBool,
}

impl ConfigPublisher {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Arc<dyn StoreClient>,
        codec: Arc<dyn Codec>,
        overrides: Arc<ConfigOverrides>,
        exports: Arc<Exports>,
        table: Arc<WatchTable>,
        current_epoch: Arc<AtomicU64>,
        dir: String,
        sid: String,
        debounce: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            codec,
            overrides,
            exports,
            table,
            current_epoch,
            dir,
            sid,
            debounce,
            last_republish: Mutex::new(None),
            republish_pending: AtomicBool::new(false),
        })
    }

    /// Publish a fresh ephemeral config node carrying the current override
    /// snapshot and install a watch on it. No-op while a node is already
    /// published (vacancy is tracked by [`Exports`]).
    pub(crate) async fn publish(self: &Arc<Self>) -> Result<()> {
        if !self.exports.config_vacant() {
            return Ok(());
        }
        Roadmap::new(self.store.clone()).mkdir(&self.dir).await?;
        let data = self.codec.encode_config(&self.overrides.snapshot())?;
        let actual = self
            .store
            .create(&format!("{}/{}", self.dir, self.sid), data, CreateMode::Ephemeral)
            .await?;
        let watcher = ConfigWatcher::arm(actual.clone(), Arc::clone(self)).await?;
        self.table.insert(actual.clone(), Watcher::Config(watcher));
        self.exports.set_config(actual);
        *self.last_republish.lock() = Some(Instant::now());
        Ok(())
    }

    /// One republish cycle: retire the current node and its watch, then
    /// publish fresh. The old watch's late delete fire is disarmed by the
    /// existence check in [`ConfigWatcher::on_deleted`].
    async fn republish(self: &Arc<Self>) -> Result<()> {
        if let Some(old) = self.exports.destroy_config().await {
            self.table.remove(&old);
        }
        self.publish().await
    }

    /// Republish now, or defer into the debounce window. At most one cycle
    /// is queued at a time; further requests inside the window coalesce into
    /// it (the queued cycle publishes the latest merged snapshot anyway).
    pub(crate) async fn schedule_republish(self: &Arc<Self>) -> Result<()> {
        let remaining = {
            let last = *self.last_republish.lock();
            last.and_then(|at| self.debounce.checked_sub(at.elapsed()))
                .filter(|wait| !wait.is_zero())
        };
        let Some(wait) = remaining else {
            return self.republish().await;
        };

        if self.republish_pending.swap(true, Ordering::SeqCst) {
            trace!("Config republish already queued, fire coalesced");
            return Ok(());
        }
        let publisher = Arc::clone(self);
        let epoch = self.current_epoch.load(Ordering::Acquire);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            publisher.republish_pending.store(false, Ordering::SeqCst);
            // A reset in the meantime republished under a fresh session;
            // this queued cycle belongs to the retired one.
            if epoch != publisher.current_epoch.load(Ordering::Acquire) {
                return;
            }
            if let Err(e) = publisher.republish().await {
                error!("Config republish failed: {}", e);
            }
        });
        Ok(())
    }
}

/// Watch over this process's own config node: merges external updates and
/// triggers the republish cycle that converges the cluster.
pub(crate) struct ConfigWatcher {
    path: String,
    epoch: u64,
    publisher: Arc<ConfigPublisher>,
}

impl ConfigWatcher {
    pub(crate) async fn arm(
        path: String,
        publisher: Arc<ConfigPublisher>,
    ) -> Result<Arc<Self>> {
        let epoch = publisher.current_epoch.load(Ordering::Acquire);
        publisher.store.exists(&path, true).await?;
        Ok(Arc::new(Self {
            path,
            epoch,
            publisher,
        }))
    }

    fn stale(&self) -> bool {
        self.epoch != self.publisher.current_epoch.load(Ordering::Acquire)
    }

    /// Fired data-changed: a peer (or operator) rewrote our node. Re-arm via
    /// get-data so an update racing the republish is not lost, merge the
    /// remote map (remote wins), then republish the merged view on a fresh
    /// node.
    pub(crate) async fn on_data_changed(&self) -> Result<()> {
        if self.stale() {
            trace!("Stale config watch on {}, event discarded", self.path);
            return Ok(());
        }
        let bytes = self.publisher.store.get_data(&self.path, true).await?;
        match self.publisher.codec.decode_config(&bytes) {
            Ok(remote) => self.publisher.overrides.merge(remote),
            Err(e) => error!("Config payload at {} undecodable: {}", self.path, e),
        }
        self.publisher.schedule_republish().await
    }

    /// Fired node-deleted without a matching local republish: somebody else
    /// removed our node. Log only; resurrection is the orchestrator's call
    /// during reset.
    ///
    /// The republished node reuses the same path, so a delete fire from our
    /// own cycle is told apart by the node existing again.
    pub(crate) async fn on_deleted(&self) {
        if self.stale() {
            trace!("Stale config watch on {}, event discarded", self.path);
            return;
        }
        match self.publisher.store.exists(&self.path, false).await {
            Ok(true) => trace!("Config: {} republished, stale delete fire ignored", self.path),
            _ => warn!("Config: {} will be deleted ... ", self.path),
        }
    }
}
