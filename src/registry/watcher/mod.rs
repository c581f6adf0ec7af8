//! Watcher hierarchy over the coordination store.
//!
//! Each watcher models an explicit armed -> fired -> rearmed state machine
//! for one watched path: a fired watch is consumed, so every handler that
//! expects further notifications re-registers its watch *before* delivering
//! side effects. The routing table maps watched paths to their watcher so
//! the single dispatch task can hand a fired event to the right handler;
//! entries removed from the table silently swallow late fires, which is the
//! second half of the stale-epoch fence.

mod config;
mod data;
mod path;

pub(crate) use config::*;
pub(crate) use data::*;
pub(crate) use path::*;

#[cfg(test)]
mod data_test;

use std::sync::Arc;

use dashmap::DashMap;

/// A registered watcher, keyed by the path its watch is armed on.
#[derive(Clone)]
pub(crate) enum Watcher {
    Path(Arc<PathWatcher>),
    Data(Arc<DataWatcher>),
    Config(Arc<ConfigWatcher>),
}

/// Path -> watcher routing table consulted by the dispatch loop.
#[derive(Default)]
pub(crate) struct WatchTable {
    entries: DashMap<String, Watcher>,
}

impl WatchTable {
    pub(crate) fn insert(
        &self,
        path: impl Into<String>,
        watcher: Watcher,
    ) {
        self.entries.insert(path.into(), watcher);
    }

    pub(crate) fn get(
        &self,
        path: &str,
    ) -> Option<Watcher> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    pub(crate) fn remove(
        &self,
        path: &str,
    ) {
        self.entries.remove(path);
    }

    /// Drop every entry; late fires from retired watches then route nowhere.
    pub(crate) fn clear(&self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
