use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::Codec;
use crate::ServiceInstance;
use crate::StoreClient;

/// Bookkeeping for the nodes this process itself has published.
///
/// Paths tracked here are ephemeral nodes owned by the current store
/// session; they become invalid the instant the session is lost, regardless
/// of what this map still says. Recovery therefore destroys the bookkeeping
/// wholesale and republishes from the snapshot.
pub(crate) struct Exports {
    store: Arc<dyn StoreClient>,
    codec: Arc<dyn Codec>,

    /// Published service nodes, path -> payload
    exported: DashMap<String, ServiceInstance>,

    /// Published status node path, at most one
    status: Mutex<Option<String>>,

    /// Published config node path, at most one
    config: Mutex<Option<String>>,
}

impl Exports {
    pub(crate) fn new(
        store: Arc<dyn StoreClient>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        Self {
            store,
            codec,
            exported: DashMap::new(),
            status: Mutex::new(None),
            config: Mutex::new(None),
        }
    }

    /// Record a published service node.
    pub(crate) fn put(
        &self,
        path: impl Into<String>,
        instance: ServiceInstance,
    ) {
        self.exported.insert(path.into(), instance);
    }

    /// True while no status node has been published.
    pub(crate) fn status_vacant(&self) -> bool {
        self.status.lock().is_none()
    }

    /// True while no config node has been published.
    pub(crate) fn config_vacant(&self) -> bool {
        self.config.lock().is_none()
    }

    pub(crate) fn set_status(
        &self,
        path: impl Into<String>,
    ) {
        *self.status.lock() = Some(path.into());
    }

    pub(crate) fn set_config(
        &self,
        path: impl Into<String>,
    ) {
        *self.config.lock() = Some(path.into());
    }

    pub(crate) fn config_node(&self) -> Option<String> {
        self.config.lock().clone()
    }

    /// Rewrite one published node with the same instance at priority zero.
    /// Soft drain: the node stays visible so consumers stop routing new work
    /// without an abrupt disappearance. Failures are logged, not retried.
    async fn demote_path(
        &self,
        path: &str,
        instance: &ServiceInstance,
    ) {
        let demoted = instance.demoted();
        let result = match self.codec.encode_instance(&demoted) {
            Ok(data) => self.store.set_data(path, data).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => info!("Demote service: {:?}", instance.host),
            Err(e) => warn!("Demote {} failed: {}", path, e),
        }
    }

    /// Demote every tracked export, continuing past individual failures.
    pub(crate) async fn demote(&self) {
        let entries: Vec<_> = self
            .exported
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (path, instance) in entries {
            self.demote_path(&path, &instance).await;
        }
    }

    /// Delete one published node if present; the bookkeeping entry is
    /// removed regardless of deletion success (it must not leak).
    pub(crate) async fn destroy_path(
        &self,
        path: &str,
    ) {
        self.delete_node(path).await;
        self.exported.remove(path);
    }

    async fn delete_node(
        &self,
        path: &str,
    ) {
        match self.store.exists(path, false).await {
            Ok(true) => {
                if let Err(e) = self.store.delete(path).await {
                    error!("Delete {} failed: {}", path, e);
                }
            }
            Ok(false) => {}
            Err(e) => error!("Exists check for {} failed: {}", path, e),
        }
    }

    /// Unpublish the status node, if any.
    pub(crate) async fn destroy_status(&self) {
        let taken = self.status.lock().take();
        if let Some(path) = taken {
            self.delete_node(&path).await;
        }
    }

    /// Unpublish the config node, if any. Returns the path it lived at so
    /// the caller can retire its watch.
    pub(crate) async fn destroy_config(&self) -> Option<String> {
        let taken = self.config.lock().take();
        if let Some(path) = &taken {
            self.delete_node(path).await;
        }
        taken
    }

    /// Unpublish everything: exports, status, config. Continues past
    /// individual failures; all bookkeeping ends up empty.
    pub(crate) async fn destroy(&self) {
        let paths: Vec<_> = self.exported.iter().map(|entry| entry.key().clone()).collect();
        for path in paths {
            self.destroy_path(&path).await;
        }
        self.destroy_status().await;
        self.destroy_config().await;
    }

    #[cfg(test)]
    pub(crate) fn exported_paths(&self) -> Vec<String> {
        self.exported.iter().map(|entry| entry.key().clone()).collect()
    }
}
