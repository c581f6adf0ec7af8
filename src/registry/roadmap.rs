use std::sync::Arc;

use crate::CreateMode;
use crate::Result;
use crate::StoreClient;

/// Builds hierarchical paths and creates their ancestor directories.
pub(crate) struct Roadmap {
    store: Arc<dyn StoreClient>,
}

impl Roadmap {
    pub(crate) fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Join `prefix/service` with the non-empty segments, `/`-separated.
    /// Pure string construction, no I/O.
    pub(crate) fn road(
        prefix: &str,
        service: &str,
        segments: &[&str],
    ) -> String {
        let mut buffer = format!("{}/{}/", prefix, service);
        for each in segments {
            if !each.is_empty() {
                buffer.push_str(each);
                buffer.push('/');
            }
        }
        buffer.truncate(buffer.len() - 1);
        buffer
    }

    /// Walk `road` component by component, creating each missing prefix as a
    /// persistent empty node.
    ///
    /// Idempotent under concurrent callers: peers race to create the same
    /// ancestors, so "already exists" from a concurrent creator is success.
    pub(crate) async fn mkdir(
        &self,
        road: &str,
    ) -> Result<String> {
        let mut buffer = String::new();
        for each in road.split('/') {
            if each.is_empty() {
                continue;
            }
            buffer.push('/');
            buffer.push_str(each);
            if !self.store.exists(&buffer, false).await? {
                match self.store.create(&buffer, Vec::new(), CreateMode::Persistent).await {
                    Ok(_) => {}
                    Err(e) if e.is_node_exists() => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(road.to_string())
    }
}
