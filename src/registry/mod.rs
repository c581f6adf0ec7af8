mod context;
mod diff;
mod exports;
mod listener;
mod roadmap;
mod snapshot;
mod types;
mod watcher;

pub use context::*;
pub use listener::*;
pub use types::*;

pub(crate) use diff::*;
pub(crate) use exports::*;
pub(crate) use roadmap::*;
pub(crate) use snapshot::*;
pub(crate) use watcher::*;

#[cfg(test)]
mod diff_test;
#[cfg(test)]
mod roadmap_test;
#[cfg(test)]
mod snapshot_test;
#[cfg(test)]
mod types_test;
