//! Configuration management module for the registry core.
//!
//! Provides layered configuration loading with priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file (`config/registry`, or an explicit path)
//! 3. `KEPLER_CONFIG`-pointed file
//! 4. Environment variables (highest priority)

mod host;
mod overrides;
mod registry;
pub use host::*;
pub use overrides::*;
pub use registry::*;

#[cfg(test)]
mod overrides_test;

//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Local host identity (address, session id)
    #[serde(default)]
    pub host: HostConfig,
    /// Registry layout, policy defaults and per-service overrides
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Settings {
    /// Load configuration from layered sources.
    ///
    /// # Arguments
    /// * `path` - Optional explicit config file; when absent the default
    ///   `config/registry` file is consulted if present
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        // 1. Base config file
        match path {
            Some(custom) => config = config.add_source(File::with_name(custom).required(true)),
            None => config = config.add_source(File::with_name("config/registry").required(false)),
        }

        // 2. Environment-pointed overlay
        if let Ok(path) = env::var("KEPLER_CONFIG") {
            config = config.add_source(File::with_name(&path));
        }

        // 3. Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("KEPLER")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(config.build()?.try_deserialize::<Settings>()?)
    }
}
