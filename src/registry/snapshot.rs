use dashmap::DashMap;
use dashmap::DashSet;

use crate::ExportHandle;
use crate::Service;
use crate::ServiceInstance;

/// Process-local mirror of the registry: discovered remote instances, plus
/// what this process has exported and subscribed to. Lives for the process;
/// the instance map is discarded wholesale during session recovery, while
/// `exported`/`imported` drive the re-publish/re-subscribe replay.
///
/// Invariant: every key in `instances` corresponds to a node the registry
/// currently believes exists in the store — an `add` callback fired for it
/// and no matching `delete` has yet.
#[derive(Default)]
pub(crate) struct Snapshot {
    /// Discovered remote instances, path -> payload
    instances: DashMap<String, ServiceInstance>,

    /// Services this process asked the registry to publish
    exported: DashMap<Service, ExportHandle>,

    /// Services this process has subscribed to
    imported: DashSet<Service>,
}

impl Snapshot {
    /// Record a discovered instance.
    pub(crate) fn put_instance(
        &self,
        path: impl Into<String>,
        instance: ServiceInstance,
    ) {
        self.instances.insert(path.into(), instance);
    }

    /// Get and remove; `None` for an unknown path makes both delete routes
    /// (children diff and data watch) idempotent.
    pub(crate) fn evict_instance(
        &self,
        path: &str,
    ) -> Option<ServiceInstance> {
        self.instances.remove(path).map(|(_, instance)| instance)
    }

    /// Discard every known instance, returning the evicted entries.
    pub(crate) fn drain_instances(&self) -> Vec<(String, ServiceInstance)> {
        let drained: Vec<_> = self
            .instances
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        self.instances.clear();
        drained
    }

    pub(crate) fn subscribe(
        &self,
        service: Service,
    ) {
        self.imported.insert(service);
    }

    pub(crate) fn exported(
        &self,
        service: Service,
        handle: ExportHandle,
    ) {
        self.exported.insert(service, handle);
    }

    pub(crate) fn imported_services(&self) -> Vec<Service> {
        self.imported.iter().map(|entry| entry.key().clone()).collect()
    }

    pub(crate) fn exported_services(&self) -> Vec<(Service, ExportHandle)> {
        self.exported
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn instance_count(&self) -> usize {
        self.instances.len()
    }

    #[cfg(test)]
    pub(crate) fn instance(
        &self,
        path: &str,
    ) -> Option<ServiceInstance> {
        self.instances.get(path).map(|entry| entry.value().clone())
    }
}
