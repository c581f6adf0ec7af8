//! The registry orchestrator.
//!
//! ## Key Responsibilities
//! - Exposes the control surface: subscribe / export / demote / reset /
//!   destroy
//! - Owns the shared local state (snapshot, exports, watcher table) and
//!   injects it into the watchers
//! - Runs the single dispatch task that consumes the store's notification
//!   channel and routes fired watches to their handlers
//! - Drives the session-recovery protocol after reconnection
//!
//! ## Example Usage
//! ```rust,ignore
//! let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let context = RegistryContext::new(settings, store, codec, listener, status, overrides);
//! let dispatch = context.start(events_rx).await?;
//! context.subscribe(&Service::new("com.kepler.Echo", "1.0", "")).await?;
//! ```

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::ConfigPublisher;
use super::Exports;
use super::PathWatcher;
use super::Roadmap;
use super::Snapshot;
use super::WatchTable;
use super::Watcher;
use crate::Codec;
use crate::ConfigOverrides;
use crate::CreateMode;
use crate::ExportHandle;
use crate::Host;
use crate::HostStatus;
use crate::ImportedListener;
use crate::ImportedService;
use crate::Result;
use crate::Service;
use crate::ServiceInstance;
use crate::Settings;
use crate::StatusSource;
use crate::StoreClient;
use crate::StoreEvent;
use crate::WatchEvent;
use crate::WatchKind;

pub struct RegistryContext {
    settings: Arc<Settings>,
    local: Host,

    store: Arc<dyn StoreClient>,
    codec: Arc<dyn Codec>,
    listener: Arc<dyn ImportedListener>,
    status: Arc<dyn StatusSource>,
    overrides: Arc<ConfigOverrides>,

    snapshot: Arc<Snapshot>,
    exports: Arc<Exports>,
    table: Arc<WatchTable>,
    roadmap: Roadmap,
    config_publisher: Arc<ConfigPublisher>,

    /// Recovery generation. Watchers capture it at arm time; `reset()`
    /// increments it, so callbacks armed under a dead session compare
    /// unequal and discard themselves.
    epoch: Arc<AtomicU64>,

    /// Serializes concurrent reset() calls (supervisor + session event)
    reset_guard: tokio::sync::Mutex<()>,

    shutdown: CancellationToken,
}

impl RegistryContext {
    pub fn new(
        settings: Settings,
        store: Arc<dyn StoreClient>,
        codec: Arc<dyn Codec>,
        listener: Arc<dyn ImportedListener>,
        status: Arc<dyn StatusSource>,
        overrides: Arc<ConfigOverrides>,
    ) -> Arc<Self> {
        let local = Host::new(settings.host.address.clone(), settings.host.sid_or_generated());
        let snapshot = Arc::new(Snapshot::default());
        let exports = Arc::new(Exports::new(store.clone(), codec.clone()));
        let table = Arc::new(WatchTable::default());
        let epoch = Arc::new(AtomicU64::new(0));
        let config_publisher = ConfigPublisher::new(
            store.clone(),
            codec.clone(),
            overrides.clone(),
            exports.clone(),
            table.clone(),
            epoch.clone(),
            settings.registry.config_path(),
            local.sid.clone(),
            Duration::from_millis(settings.registry.config_debounce_ms),
        );

        Arc::new(Self {
            settings: Arc::new(settings),
            local,
            store: store.clone(),
            codec,
            listener,
            status,
            overrides,
            snapshot,
            exports,
            table,
            roadmap: Roadmap::new(store),
            config_publisher,
            epoch,
            reset_guard: tokio::sync::Mutex::new(()),
            shutdown: CancellationToken::new(),
        })
    }

    /// Publish the status and config nodes, then spawn the dispatch task
    /// over the store's notification channel.
    pub async fn start(
        self: &Arc<Self>,
        events: mpsc::UnboundedReceiver<StoreEvent>,
    ) -> Result<JoinHandle<()>> {
        self.publish_status().await?;
        self.publish_config().await?;
        Ok(self.spawn_dispatch(events))
    }

    pub fn local(&self) -> &Host {
        &self.local
    }

    /// The merged configuration-override view (local plus everything peers
    /// have published).
    pub fn overrides(&self) -> &Arc<ConfigOverrides> {
        &self.overrides
    }

    /// Subscribe to a remote service: arm a children watch over its path,
    /// seed the local mirror from the current instance list, and declare the
    /// dependency. Gated by the per-service import policy.
    pub async fn subscribe(
        &self,
        service: &Service,
    ) -> Result<()> {
        let policy = self.settings.registry.policy(service);
        if !policy.import_enabled {
            warn!("Disabled import service: {:?} ... ", service);
            return Ok(());
        }

        let path = Roadmap::road(
            &self.settings.registry.root,
            &service.name,
            &[&service.version_and_catalog()],
        );
        match PathWatcher::arm(
            service.clone(),
            path.clone(),
            self.store.clone(),
            self.codec.clone(),
            self.listener.clone(),
            self.snapshot.clone(),
            self.table.clone(),
            self.epoch.clone(),
        )
        .await
        {
            Ok(watcher) => {
                self.table.insert(path, Watcher::Path(watcher.clone()));
                watcher.seed().await;
            }
            // No provider published yet; the watch could not be armed either,
            // so rediscovery waits for the next subscribe cycle (reset).
            Err(e) if e.is_no_node() => {
                if policy.optional {
                    info!("Instance can not be found for optional service: {:?}", service);
                } else {
                    warn!("Instance can not be found for service: {:?}: {}", service, e);
                }
            }
            Err(e) => error!("Watch service {:?} failed: {}", service, e),
        }

        self.snapshot.subscribe(service.clone());
        self.publish_dependency(service).await?;
        info!("Import service: {:?}", service);
        Ok(())
    }

    /// Publish a local service as an ephemeral-sequential instance node.
    /// Gated by the per-service export policy; tag and priority come from
    /// the same policy resolution.
    pub async fn export(
        &self,
        service: &Service,
        handle: ExportHandle,
    ) -> Result<()> {
        let policy = self.settings.registry.policy(service);
        if !policy.export_enabled {
            warn!("Disabled export service: {:?} ... ", service);
            return Ok(());
        }

        let host = self
            .local
            .clone()
            .with_tag(policy.tag)
            .with_priority(policy.priority);
        let instance = ServiceInstance::new(host, service.clone());

        let dir = self
            .roadmap
            .mkdir(&Roadmap::road(
                &self.settings.registry.root,
                &service.name,
                &[&service.version_and_catalog()],
            ))
            .await?;
        let data = self.codec.encode_instance(&instance)?;
        let actual = self
            .store
            .create(&format!("{}/", dir), data, CreateMode::EphemeralSequential)
            .await?;

        self.exports.put(actual, instance);
        self.snapshot.exported(service.clone(), handle);
        info!("Export service: {:?} ... ", service);
        Ok(())
    }

    /// Soft-drain every published instance (priority forced to zero).
    pub async fn demote(&self) -> Result<()> {
        self.exports.demote().await;
        Ok(())
    }

    /// Unpublish everything and release the store session. Failures here
    /// propagate to whatever supervises the process lifecycle.
    pub async fn destroy(&self) -> Result<()> {
        self.exports.destroy().await;
        self.table.clear();
        self.shutdown.cancel();
        self.store.close().await?;
        Ok(())
    }

    /// Session-recovery barrier, invoked after reconnection.
    ///
    /// Nothing remote is trusted until rediscovered: the old session's
    /// export bookkeeping is destroyed (its ephemeral nodes already died
    /// with the session), every known instance is invalidated with a
    /// `delete` callback, then exports, subscriptions, status and config are
    /// replayed from the snapshot.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.reset_guard.lock().await;

        // Fence: callbacks armed under the old session now compare stale,
        // and their routing entries are gone.
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.table.clear();

        self.exports.destroy().await;
        self.reset_instances();
        self.reset_exported().await?;
        self.reset_imported().await?;
        self.publish_status().await?;
        self.publish_config().await?;
        Ok(())
    }

    /// Pessimistic invalidation: every previously known instance is reported
    /// deleted before rediscovery repopulates the mirror.
    fn reset_instances(&self) {
        for (path, instance) in self.snapshot.drain_instances() {
            if let Err(e) = self.listener.delete(instance) {
                warn!("Delete callback for {} failed: {}", path, e);
            }
        }
        info!("Reset instance success ...");
    }

    async fn reset_exported(&self) -> Result<()> {
        for (service, handle) in self.snapshot.exported_services() {
            self.export(&service, handle).await?;
        }
        info!("Reset exported success ...");
        Ok(())
    }

    async fn reset_imported(&self) -> Result<()> {
        for service in self.snapshot.imported_services() {
            self.subscribe(&service).await?;
        }
        info!("Reset imported success ...");
        Ok(())
    }

    pub(crate) async fn publish_status(&self) -> Result<()> {
        if !(self.settings.registry.status_enabled && self.exports.status_vacant()) {
            return Ok(());
        }
        let dir = self.roadmap.mkdir(&self.settings.registry.status_path()).await?;
        let payload = HostStatus::new(self.local.clone(), self.status.snapshot());
        let data = self.codec.encode_status(&payload)?;
        let actual = self
            .store
            .create(&format!("{}/{}", dir, self.local.sid), data, CreateMode::Ephemeral)
            .await?;
        self.exports.set_status(actual);
        Ok(())
    }

    pub(crate) async fn publish_config(&self) -> Result<()> {
        if !self.settings.registry.config_enabled {
            return Ok(());
        }
        self.config_publisher.publish().await
    }

    /// Declare this consumer's dependency on `service` as an
    /// ephemeral-sequential record, when the per-service policy asks for it.
    async fn publish_dependency(
        &self,
        service: &Service,
    ) -> Result<()> {
        if !self.settings.registry.policy(service).dependency_enabled {
            return Ok(());
        }
        let dir = self
            .roadmap
            .mkdir(&Roadmap::road(
                &self.settings.registry.dependency_path(),
                &service.name,
                &[&service.version_and_catalog()],
            ))
            .await?;
        let record = ImportedService::new(self.local.clone(), service.clone());
        let data = self.codec.encode_dependency(&record)?;
        self.store
            .create(&format!("{}/", dir), data, CreateMode::EphemeralSequential)
            .await?;
        Ok(())
    }

    fn spawn_dispatch(
        self: &Arc<Self>,
        mut events: mpsc::UnboundedReceiver<StoreEvent>,
    ) -> JoinHandle<()> {
        let context = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Use biased to ensure branch order
                    biased;
                    _ = context.shutdown.cancelled() => {
                        warn!("Registry dispatch stopped.");
                        return;
                    }
                    event = events.recv() => {
                        match event {
                            Some(event) => context.dispatch(event).await,
                            None => {
                                warn!("Store event channel closed.");
                                return;
                            }
                        }
                    }
                }
            }
        })
    }

    pub(crate) async fn dispatch(
        &self,
        event: StoreEvent,
    ) {
        info!("Receive event: {:?}", event);
        match event {
            StoreEvent::Watch(event) => self.dispatch_watch(event).await,
            StoreEvent::SessionLost => {
                warn!("Store session lost, ephemeral exports are gone ...");
            }
            StoreEvent::SessionRestored => {
                if let Err(e) = self.reset().await {
                    error!("Reset after reconnect failed: {}", e);
                }
            }
        }
    }

    /// Route one fired watch. Handler failures are logged and never
    /// propagate: a panic or error escaping here would kill the dispatch
    /// task and with it every future notification.
    async fn dispatch_watch(
        &self,
        event: WatchEvent,
    ) {
        let Some(watcher) = self.table.get(&event.path) else {
            trace!("No watcher armed for {}, event dropped", event.path);
            return;
        };
        match (watcher, event.kind) {
            (Watcher::Path(watcher), WatchKind::ChildrenChanged) => {
                if let Err(e) = watcher.on_children_changed().await {
                    error!("Reconfig of {} failed: {}", event.path, e);
                }
            }
            (Watcher::Data(watcher), WatchKind::DataChanged) => {
                if let Err(e) = watcher.on_data_changed().await {
                    error!("Instance refresh of {} failed: {}", event.path, e);
                }
            }
            (Watcher::Data(watcher), WatchKind::NodeDeleted) => {
                self.table.remove(&event.path);
                watcher.on_deleted();
            }
            (Watcher::Config(watcher), WatchKind::DataChanged) => {
                if let Err(e) = watcher.on_data_changed().await {
                    error!("Config refresh of {} failed: {}", event.path, e);
                }
            }
            (Watcher::Config(watcher), WatchKind::NodeDeleted) => watcher.on_deleted().await,
            (_, kind) => warn!("Can not process event: {:?} at {}", kind, event.path),
        }
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    #[cfg(test)]
    pub(crate) fn exports(&self) -> &Arc<Exports> {
        &self.exports
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &Arc<WatchTable> {
        &self.table
    }

    #[cfg(test)]
    pub(crate) fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}
