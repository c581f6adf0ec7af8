use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::Service;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Root path every registry node lives under
    #[serde(default = "default_root")]
    pub root: String,

    /// Directory (under root) for per-process status nodes
    #[serde(default = "default_status_dir")]
    pub status_dir: String,

    /// Directory (under root) for per-process configuration-override nodes
    #[serde(default = "default_config_dir")]
    pub config_dir: String,

    /// Directory (under root) for dependency declarations
    #[serde(default = "default_dependency_dir")]
    pub dependency_dir: String,

    /// Whether subscribe() imports remote services by default
    #[serde(default = "default_true")]
    pub import_enabled: bool,

    /// Whether export() publishes local services by default
    #[serde(default = "default_true")]
    pub export_enabled: bool,

    /// Whether subscribe() publishes a dependency record by default
    #[serde(default = "default_true")]
    pub dependency_enabled: bool,

    /// Whether the status node is published
    #[serde(default = "default_true")]
    pub status_enabled: bool,

    /// Whether the configuration-override node is published and watched
    #[serde(default = "default_true")]
    pub config_enabled: bool,

    /// Default routing tag stamped on published instances
    #[serde(default)]
    pub tag: String,

    /// Default routing priority stamped on published instances; demotion
    /// rewrites it to zero
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Minimum interval between config-node republish cycles
    #[serde(default = "default_config_debounce_ms")]
    pub config_debounce_ms: u64,

    /// Per-service policy overrides, keyed by full identity
    /// (`name:versionAndCatalog`) with a bare service-name fallback
    #[serde(default)]
    pub services: HashMap<String, ServicePolicy>,
}

/// Per-service knobs; every field falls back to the global default.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServicePolicy {
    #[serde(default)]
    pub import_enabled: Option<bool>,
    #[serde(default)]
    pub export_enabled: Option<bool>,
    #[serde(default)]
    pub dependency_enabled: Option<bool>,
    /// Marked services log missing providers as expected absence
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// Effective, fully resolved policy for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfile {
    pub import_enabled: bool,
    pub export_enabled: bool,
    pub dependency_enabled: bool,
    pub optional: bool,
    pub tag: String,
    pub priority: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            status_dir: default_status_dir(),
            config_dir: default_config_dir(),
            dependency_dir: default_dependency_dir(),
            import_enabled: true,
            export_enabled: true,
            dependency_enabled: true,
            status_enabled: true,
            config_enabled: true,
            tag: String::new(),
            priority: default_priority(),
            config_debounce_ms: default_config_debounce_ms(),
            services: HashMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Resolve the effective policy for `service`: the full-identity override
    /// wins over the service-name override, which wins over the defaults.
    pub fn policy(
        &self,
        service: &Service,
    ) -> ServiceProfile {
        let overrides = self
            .services
            .get(&service.identity())
            .or_else(|| self.services.get(&service.name));

        ServiceProfile {
            import_enabled: overrides
                .and_then(|o| o.import_enabled)
                .unwrap_or(self.import_enabled),
            export_enabled: overrides
                .and_then(|o| o.export_enabled)
                .unwrap_or(self.export_enabled),
            dependency_enabled: overrides
                .and_then(|o| o.dependency_enabled)
                .unwrap_or(self.dependency_enabled),
            optional: overrides.and_then(|o| o.optional).unwrap_or(false),
            tag: overrides
                .and_then(|o| o.tag.clone())
                .unwrap_or_else(|| self.tag.clone()),
            priority: overrides.and_then(|o| o.priority).unwrap_or(self.priority),
        }
    }

    /// `{root}/{status_dir}`
    pub fn status_path(&self) -> String {
        format!("{}/{}", self.root, self.status_dir)
    }

    /// `{root}/{config_dir}`
    pub fn config_path(&self) -> String {
        format!("{}/{}", self.root, self.config_dir)
    }

    /// `{root}/{dependency_dir}`
    pub fn dependency_path(&self) -> String {
        format!("{}/{}", self.root, self.dependency_dir)
    }
}

fn default_root() -> String {
    "/kepler".to_string()
}

fn default_status_dir() -> String {
    "_status".to_string()
}

fn default_config_dir() -> String {
    "_configs".to_string()
}

fn default_dependency_dir() -> String {
    "_dependency".to_string()
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u32 {
    1
}

fn default_config_debounce_ms() -> u64 {
    1000
}
