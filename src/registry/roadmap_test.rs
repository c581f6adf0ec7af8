use std::sync::Arc;

use mockall::predicate::eq;

use crate::registry::Roadmap;
use crate::CreateMode;
use crate::MockStoreClient;
use crate::StoreError;

#[test]
fn test_road_joins_segments() {
    assert_eq!(
        Roadmap::road("/kepler", "com.kepler.Echo", &["1.0"]),
        "/kepler/com.kepler.Echo/1.0"
    );
}

#[test]
fn test_road_skips_empty_segments() {
    assert_eq!(
        Roadmap::road("/kepler", "com.kepler.Echo", &["", "1.0", ""]),
        "/kepler/com.kepler.Echo/1.0"
    );
}

#[test]
fn test_road_trims_trailing_separator() {
    assert_eq!(Roadmap::road("/kepler", "com.kepler.Echo", &[]), "/kepler/com.kepler.Echo");
}

#[tokio::test]
async fn test_mkdir_creates_missing_prefixes() {
    let mut store = MockStoreClient::new();
    store
        .expect_exists()
        .with(eq("/kepler"), eq(false))
        .times(1)
        .returning(|_, _| Ok(true));
    store
        .expect_exists()
        .with(eq("/kepler/svc"), eq(false))
        .times(1)
        .returning(|_, _| Ok(false));
    store
        .expect_create()
        .with(eq("/kepler/svc"), eq(Vec::new()), eq(CreateMode::Persistent))
        .times(1)
        .returning(|path, _, _| Ok(path.to_string()));

    let roadmap = Roadmap::new(Arc::new(store));
    let created = roadmap.mkdir("/kepler/svc").await.expect("mkdir");
    assert_eq!(created, "/kepler/svc");
}

#[tokio::test]
async fn test_mkdir_concurrent_creator_is_success() {
    // A peer wins the race between the exists check and the create; the
    // resulting NodeExists is success, not failure.
    let mut store = MockStoreClient::new();
    store.expect_exists().returning(|_, _| Ok(false));
    store
        .expect_create()
        .returning(|path, _, _| Err(StoreError::NodeExists(path.to_string()).into()));

    let roadmap = Roadmap::new(Arc::new(store));
    assert!(roadmap.mkdir("/kepler/svc/1.0").await.is_ok());
}

#[tokio::test]
async fn test_mkdir_propagates_other_errors() {
    let mut store = MockStoreClient::new();
    store.expect_exists().returning(|_, _| Ok(false));
    store
        .expect_create()
        .returning(|_, _, _| Err(StoreError::ConnectionLoss("broken pipe".to_string()).into()));

    let roadmap = Roadmap::new(Arc::new(store));
    assert!(roadmap.mkdir("/kepler/svc").await.is_err());
}
