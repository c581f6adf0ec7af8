use std::sync::Arc;

use crate::registry::Snapshot;
use crate::Host;
use crate::Service;
use crate::ServiceInstance;

fn instance(sid: &str) -> ServiceInstance {
    ServiceInstance::new(
        Host::new("10.0.0.1:9090", sid),
        Service::new("com.kepler.Echo", "1.0", ""),
    )
}

#[test]
fn test_evict_is_get_and_remove() {
    let snapshot = Snapshot::default();
    snapshot.put_instance("/kepler/svc/1.0/0000000001", instance("sid-a"));

    let evicted = snapshot.evict_instance("/kepler/svc/1.0/0000000001");
    assert_eq!(evicted, Some(instance("sid-a")));
    assert_eq!(snapshot.instance_count(), 0);
}

#[test]
fn test_evict_unknown_path_is_noop() {
    let snapshot = Snapshot::default();
    assert!(snapshot.evict_instance("/kepler/svc/1.0/0000000009").is_none());
    // And again, still nothing.
    assert!(snapshot.evict_instance("/kepler/svc/1.0/0000000009").is_none());
}

#[test]
fn test_drain_empties_instances() {
    let snapshot = Snapshot::default();
    snapshot.put_instance("/a", instance("sid-a"));
    snapshot.put_instance("/b", instance("sid-b"));

    let drained = snapshot.drain_instances();
    assert_eq!(drained.len(), 2);
    assert_eq!(snapshot.instance_count(), 0);
}

#[test]
fn test_exported_and_imported_bookkeeping() {
    let snapshot = Snapshot::default();
    let service = Service::new("com.kepler.Echo", "1.0", "");
    snapshot.subscribe(service.clone());
    snapshot.subscribe(service.clone());
    snapshot.exported(service.clone(), Arc::new(()));

    assert_eq!(snapshot.imported_services(), vec![service.clone()]);
    let exported = snapshot.exported_services();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].0, service);
}
