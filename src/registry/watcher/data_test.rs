use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::DataWatcher;
use crate::registry::Snapshot;
use crate::test_utils::MemoryStore;
use crate::test_utils::RecordingListener;
use crate::BincodeCodec;
use crate::Codec;
use crate::CreateMode;
use crate::Error;
use crate::Host;
use crate::RegistryError;
use crate::Service;
use crate::ServiceInstance;
use crate::StoreClient;
use crate::StoreEvent;
use crate::WatchEvent;
use crate::WatchKind;

const PATH: &str = "/kepler/svc/0000000001";

fn instance(tag: &str) -> ServiceInstance {
    ServiceInstance::new(
        Host::new("10.0.0.1:9090", "sid-data").with_tag(tag),
        Service::new("com.kepler.Echo", "1.0", ""),
    )
}

struct Fixture {
    store: Arc<MemoryStore>,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    listener: Arc<RecordingListener>,
    snapshot: Arc<Snapshot>,
    epoch: Arc<AtomicU64>,
}

async fn fixture(payload: Vec<u8>) -> Fixture {
    let (tx, events) = mpsc::unbounded_channel();
    let store = MemoryStore::new(tx);
    store.create("/kepler", Vec::new(), CreateMode::Persistent).await.expect("root");
    store
        .create("/kepler/svc", Vec::new(), CreateMode::Persistent)
        .await
        .expect("dir");
    store.create(PATH, payload, CreateMode::Ephemeral).await.expect("node");
    Fixture {
        store,
        events,
        listener: Arc::new(RecordingListener::default()),
        snapshot: Arc::new(Snapshot::default()),
        epoch: Arc::new(AtomicU64::new(0)),
    }
}

async fn arm(fixture: &Fixture) -> Arc<DataWatcher> {
    DataWatcher::arm(
        PATH.to_string(),
        fixture.store.clone(),
        Arc::new(BincodeCodec),
        fixture.listener.clone(),
        fixture.snapshot.clone(),
        fixture.epoch.clone(),
    )
    .await
    .expect("arm")
}

#[tokio::test]
async fn test_arm_caches_decoded_value() {
    let original = instance("stable");
    let fixture = fixture(BincodeCodec.encode_instance(&original).expect("encode")).await;
    let watcher = arm(&fixture).await;
    assert_eq!(watcher.last(), original);
}

#[tokio::test]
async fn test_arm_on_corrupt_payload_is_fatal() {
    let fixture = fixture(vec![0xde, 0xad]).await;
    let result = DataWatcher::arm(
        PATH.to_string(),
        fixture.store.clone(),
        Arc::new(BincodeCodec),
        fixture.listener.clone(),
        fixture.snapshot.clone(),
        fixture.epoch.clone(),
    )
    .await;
    assert!(matches!(
        result,
        Err(Error::Registry(RegistryError::IncompatiblePayload { .. }))
    ));
}

#[tokio::test]
async fn test_change_rearms_before_delivery() {
    let original = instance("stable");
    let mut fixture = fixture(BincodeCodec.encode_instance(&original).expect("encode")).await;
    let watcher = arm(&fixture).await;

    let updated = instance("gray");
    fixture
        .store
        .external_set(PATH, BincodeCodec.encode_instance(&updated).expect("encode"));
    assert_eq!(
        fixture.events.try_recv().expect("event"),
        StoreEvent::Watch(WatchEvent::new(PATH, WatchKind::DataChanged))
    );
    watcher.on_data_changed().await.expect("handle");

    assert_eq!(fixture.listener.changes(), vec![(original, updated.clone())]);
    assert_eq!(watcher.last(), updated);

    // The handler re-armed the watch: a further mutation fires again.
    fixture
        .store
        .external_set(PATH, BincodeCodec.encode_instance(&instance("blue")).expect("encode"));
    assert_eq!(
        fixture.events.try_recv().expect("event"),
        StoreEvent::Watch(WatchEvent::new(PATH, WatchKind::DataChanged))
    );
}

#[tokio::test]
async fn test_delete_is_idempotent_with_children_route() {
    let original = instance("stable");
    let fixture = fixture(BincodeCodec.encode_instance(&original).expect("encode")).await;
    let watcher = arm(&fixture).await;
    fixture.snapshot.put_instance(PATH, original.clone());

    watcher.on_deleted();
    assert_eq!(fixture.listener.deletes(), vec![original]);

    // The children diff already evicted it, or this fires twice: no-op.
    watcher.on_deleted();
    assert_eq!(fixture.listener.deletes().len(), 1);
}

#[tokio::test]
async fn test_stale_epoch_discards_events() {
    let original = instance("stable");
    let fixture = fixture(BincodeCodec.encode_instance(&original).expect("encode")).await;
    let watcher = arm(&fixture).await;
    fixture.snapshot.put_instance(PATH, original);

    // A reset retired this watcher's session.
    fixture.epoch.fetch_add(1, Ordering::AcqRel);

    fixture
        .store
        .external_set(PATH, BincodeCodec.encode_instance(&instance("gray")).expect("encode"));
    watcher.on_data_changed().await.expect("handle");
    watcher.on_deleted();

    assert!(fixture.listener.events().is_empty());
    assert_eq!(fixture.snapshot.instance_count(), 1);
}
