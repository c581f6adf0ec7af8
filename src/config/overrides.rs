use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// This process's runtime configuration overrides: the map published at the
/// config node and merged with what peers publish.
///
/// Readers get an immutable snapshot; merges swap in a fresh map, so a reader
/// never observes a half-applied remote update.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    map: ArcSwap<HashMap<String, String>>,
}

impl ConfigOverrides {
    pub fn new(initial: HashMap<String, String>) -> Self {
        Self {
            map: ArcSwap::from_pointee(initial),
        }
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        self.map.load().get(key).cloned()
    }

    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        let key = key.into();
        let value = value.into();
        self.map.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), value.clone());
            next
        });
    }

    /// Merge a remote override map; remote values win over local ones.
    pub fn merge(
        &self,
        remote: HashMap<String, String>,
    ) {
        self.map.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.extend(remote.clone());
            next
        });
    }

    /// Immutable snapshot of the current overrides.
    pub fn snapshot(&self) -> HashMap<String, String> {
        HashMap::clone(&self.map.load())
    }

    pub fn snapshot_arc(&self) -> Arc<HashMap<String, String>> {
        self.map.load_full()
    }
}
