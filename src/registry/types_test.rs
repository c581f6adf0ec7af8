use crate::Host;
use crate::Service;
use crate::ServiceInstance;

#[test]
fn test_version_and_catalog() {
    assert_eq!(Service::new("com.kepler.Echo", "1.0", "").version_and_catalog(), "1.0");
    assert_eq!(
        Service::new("com.kepler.Echo", "1.0", "gray").version_and_catalog(),
        "1.0_gray"
    );
}

#[test]
fn test_identity() {
    assert_eq!(
        Service::new("com.kepler.Echo", "2.1", "lane").identity(),
        "com.kepler.Echo:2.1_lane"
    );
}

#[test]
fn test_demoted_touches_only_priority() {
    let host = Host::new("10.1.2.3:9090", "sid-1").with_tag("stable").with_priority(7);
    let instance = ServiceInstance::new(host.clone(), Service::new("com.kepler.Echo", "1.0", ""));
    let demoted = instance.demoted();

    assert_eq!(demoted.host.priority, 0);
    assert_eq!(demoted.host.address, host.address);
    assert_eq!(demoted.host.sid, host.sid);
    assert_eq!(demoted.host.tag, host.tag);
    assert_eq!(demoted.service, instance.service);
}
