//! Registry value types.
//!
//! Everything here is an immutable value replaced wholesale on change; the
//! store payloads ([`ServiceInstance`], [`ImportedService`], [`HostStatus`])
//! are what the [`Codec`](crate::Codec) moves across the wire.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// Service identity; used as a map key across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub version: String,
    pub catalog: String,
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        catalog: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            catalog: catalog.into(),
        }
    }

    /// Version-and-catalog path segment: `{version}` for an empty catalog,
    /// `{version}_{catalog}` otherwise.
    pub fn version_and_catalog(&self) -> String {
        if self.catalog.is_empty() {
            self.version.clone()
        } else {
            format!("{}_{}", self.version, self.catalog)
        }
    }

    /// Full identity used for policy lookup: `{name}:{versionAndCatalog}`.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.name, self.version_and_catalog())
    }
}

/// Network endpoint plus routing attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// `host:port` network address
    pub address: String,
    /// Stable session identifier of the publishing process
    pub sid: String,
    /// Routing tag (profile/lane selection)
    pub tag: String,
    /// Routing priority; zero means demoted (drain, route nothing new)
    pub priority: u32,
}

impl Host {
    pub fn new(
        address: impl Into<String>,
        sid: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            sid: sid.into(),
            tag: String::new(),
            priority: 1,
        }
    }

    pub fn with_tag(
        mut self,
        tag: impl Into<String>,
    ) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_priority(
        mut self,
        priority: u32,
    ) -> Self {
        self.priority = priority;
        self
    }
}

/// The payload published at an ephemeral service node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub host: Host,
    pub service: Service,
}

impl ServiceInstance {
    pub fn new(
        host: Host,
        service: Service,
    ) -> Self {
        Self { host, service }
    }

    /// Same instance with priority forced to zero. Demotion keeps the node
    /// visible so consumers drain it instead of seeing an abrupt
    /// disappearance.
    pub fn demoted(&self) -> Self {
        Self {
            host: self.host.clone().with_priority(0),
            service: self.service.clone(),
        }
    }
}

/// Dependency declaration a consumer publishes when it subscribes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedService {
    pub consumer: Host,
    pub service: Service,
}

impl ImportedService {
    pub fn new(
        consumer: Host,
        service: Service,
    ) -> Self {
        Self { consumer, service }
    }
}

/// Status payload published at this process's status node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub host: Host,
    pub status: HashMap<String, String>,
}

impl HostStatus {
    pub fn new(
        host: Host,
        status: HashMap<String, String>,
    ) -> Self {
        Self { host, status }
    }
}

/// Opaque handle the application associates with an exported service (its
/// server-side implementation); the registry only stores it and hands it
/// back when re-exporting during recovery.
pub type ExportHandle = Arc<dyn Any + Send + Sync>;
