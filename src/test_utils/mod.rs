//! Shared test fixtures: an in-memory coordination store with real one-shot
//! watch delivery, a recording listener, and a fixed status source.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::DashSet;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::CreateMode;
use crate::ImportedListener;
use crate::Result;
use crate::ServiceInstance;
use crate::StatusSource;
use crate::StoreClient;
use crate::StoreError;
use crate::StoreEvent;
use crate::WatchEvent;
use crate::WatchKind;

struct NodeRecord {
    data: Vec<u8>,
    mode: CreateMode,
}

/// In-memory [`StoreClient`] with faithful one-shot watch semantics: a watch
/// fires once and is consumed; handlers must re-arm to keep observing.
pub struct MemoryStore {
    nodes: DashMap<String, NodeRecord>,
    seq: AtomicU64,
    children_watches: DashSet<String>,
    data_watches: DashSet<String>,
    events: mpsc::UnboundedSender<StoreEvent>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new(events: mpsc::UnboundedSender<StoreEvent>) -> Arc<Self> {
        Arc::new(Self {
            nodes: DashMap::new(),
            seq: AtomicU64::new(0),
            children_watches: DashSet::new(),
            data_watches: DashSet::new(),
            events,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed.into());
        }
        Ok(())
    }

    fn parent(path: &str) -> &str {
        match path.rfind('/') {
            Some(index) => &path[..index],
            None => "",
        }
    }

    fn fire_children_changed(
        &self,
        parent: &str,
    ) {
        if self.children_watches.remove(parent).is_some() {
            let _ = self.events.send(StoreEvent::Watch(WatchEvent::new(
                parent,
                WatchKind::ChildrenChanged,
            )));
        }
    }

    fn fire_data(
        &self,
        path: &str,
        kind: WatchKind,
    ) {
        if self.data_watches.remove(path).is_some() {
            let _ = self.events.send(StoreEvent::Watch(WatchEvent::new(path, kind)));
        }
    }

    /// Mutate a node from "outside" (another participant), firing watches.
    pub fn external_set(
        &self,
        path: &str,
        data: Vec<u8>,
    ) {
        if let Some(mut record) = self.nodes.get_mut(path) {
            record.data = data;
        }
        self.fire_data(path, WatchKind::DataChanged);
    }

    /// Remove a node from "outside", firing watches.
    pub fn external_delete(
        &self,
        path: &str,
    ) {
        if self.nodes.remove(path).is_some() {
            self.fire_data(path, WatchKind::NodeDeleted);
            self.fire_children_changed(Self::parent(path));
        }
    }

    /// Create a node from "outside", firing the parent's children watch.
    pub fn external_create(
        &self,
        path: &str,
        data: Vec<u8>,
    ) {
        self.nodes.insert(
            path.to_string(),
            NodeRecord {
                data,
                mode: CreateMode::Ephemeral,
            },
        );
        self.fire_children_changed(Self::parent(path));
    }

    /// Simulate session death: every ephemeral node this session owned is
    /// gone and every armed watch is dead; nothing fires.
    pub fn expire_session(&self) {
        self.nodes.retain(|_, record| record.mode == CreateMode::Persistent);
        self.children_watches.clear();
        self.data_watches.clear();
        self.closed.store(false, Ordering::Release);
    }

    pub fn has_node(
        &self,
        path: &str,
    ) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn node_data(
        &self,
        path: &str,
    ) -> Option<Vec<u8>> {
        self.nodes.get(path).map(|record| record.data.clone())
    }

    /// Full paths of the direct children of `dir`, sorted.
    pub fn paths_under(
        &self,
        dir: &str,
    ) -> Vec<String> {
        let mut paths: Vec<_> = self
            .nodes
            .iter()
            .filter(|entry| Self::parent(entry.key()) == dir)
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn create(
        &self,
        path: &str,
        data: Vec<u8>,
        mode: CreateMode,
    ) -> Result<String> {
        self.ensure_open()?;
        let actual = match mode {
            CreateMode::EphemeralSequential => {
                format!("{}{:010}", path, self.seq.fetch_add(1, Ordering::AcqRel))
            }
            _ => path.to_string(),
        };
        let parent = Self::parent(&actual).to_string();
        if !parent.is_empty() && !self.nodes.contains_key(&parent) {
            return Err(StoreError::NoNode(parent).into());
        }
        if self.nodes.contains_key(&actual) {
            return Err(StoreError::NodeExists(actual).into());
        }
        self.nodes.insert(actual.clone(), NodeRecord { data, mode });
        self.fire_children_changed(&parent);
        Ok(actual)
    }

    async fn delete(
        &self,
        path: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        if self.nodes.remove(path).is_none() {
            return Err(StoreError::NoNode(path.to_string()).into());
        }
        self.fire_data(path, WatchKind::NodeDeleted);
        self.fire_children_changed(Self::parent(path));
        Ok(())
    }

    async fn set_data(
        &self,
        path: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        self.ensure_open()?;
        match self.nodes.get_mut(path) {
            Some(mut record) => {
                record.data = data;
            }
            None => return Err(StoreError::NoNode(path.to_string()).into()),
        }
        self.fire_data(path, WatchKind::DataChanged);
        Ok(())
    }

    async fn exists(
        &self,
        path: &str,
        watch: bool,
    ) -> Result<bool> {
        self.ensure_open()?;
        if watch {
            self.data_watches.insert(path.to_string());
        }
        Ok(self.nodes.contains_key(path))
    }

    async fn get_children(
        &self,
        path: &str,
        watch: bool,
    ) -> Result<Vec<String>> {
        self.ensure_open()?;
        if !self.nodes.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()).into());
        }
        if watch {
            self.children_watches.insert(path.to_string());
        }
        Ok(self
            .nodes
            .iter()
            .filter(|entry| Self::parent(entry.key()) == path)
            .map(|entry| entry.key()[path.len() + 1..].to_string())
            .collect())
    }

    async fn get_data(
        &self,
        path: &str,
        watch: bool,
    ) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let data = match self.nodes.get(path) {
            Some(record) => record.data.clone(),
            None => return Err(StoreError::NoNode(path.to_string()).into()),
        };
        if watch {
            self.data_watches.insert(path.to_string());
        }
        Ok(data)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// What a [`RecordingListener`] observed, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Add(ServiceInstance),
    Change(ServiceInstance, ServiceInstance),
    Delete(ServiceInstance),
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    pub fn adds(&self) -> Vec<ServiceInstance> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::Add(instance) => Some(instance),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<ServiceInstance> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::Delete(instance) => Some(instance),
                _ => None,
            })
            .collect()
    }

    pub fn changes(&self) -> Vec<(ServiceInstance, ServiceInstance)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::Change(previous, current) => Some((previous, current)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ImportedListener for RecordingListener {
    fn add(
        &self,
        instance: ServiceInstance,
    ) -> Result<()> {
        self.events.lock().push(ListenerEvent::Add(instance));
        Ok(())
    }

    fn change(
        &self,
        previous: ServiceInstance,
        current: ServiceInstance,
    ) -> Result<()> {
        self.events.lock().push(ListenerEvent::Change(previous, current));
        Ok(())
    }

    fn delete(
        &self,
        instance: ServiceInstance,
    ) -> Result<()> {
        self.events.lock().push(ListenerEvent::Delete(instance));
        Ok(())
    }
}

/// [`StatusSource`] returning a fixed map.
#[derive(Default)]
pub struct FixedStatus {
    status: HashMap<String, String>,
}

impl FixedStatus {
    pub fn new(status: HashMap<String, String>) -> Self {
        Self { status }
    }
}

impl StatusSource for FixedStatus {
    fn snapshot(&self) -> HashMap<String, String> {
        self.status.clone()
    }
}
