use std::collections::HashMap;

use crate::BincodeCodec;
use crate::Codec;
use crate::Host;
use crate::Service;
use crate::ServiceInstance;

fn sample_instance() -> ServiceInstance {
    let host = Host::new("10.0.0.7:9090", "sid-codec").with_tag("gray").with_priority(3);
    ServiceInstance::new(host, Service::new("com.kepler.Echo", "1.0", ""))
}

#[test]
fn test_instance_round_trip() {
    let codec = BincodeCodec;
    let instance = sample_instance();
    let bytes = codec.encode_instance(&instance).expect("encode");
    let decoded = codec.decode_instance(&bytes).expect("decode");
    assert_eq!(instance, decoded);
}

#[test]
fn test_config_round_trip() {
    let codec = BincodeCodec;
    let mut map = HashMap::new();
    map.insert("timeout".to_string(), "3000".to_string());
    map.insert("retry".to_string(), "2".to_string());
    let bytes = codec.encode_config(&map).expect("encode");
    assert_eq!(map, codec.decode_config(&bytes).expect("decode"));
}

#[test]
fn test_decode_garbage_is_an_error() {
    let codec = BincodeCodec;
    // Truncated payload must surface a codec error, never panic.
    let bytes = codec.encode_instance(&sample_instance()).expect("encode");
    assert!(codec.decode_instance(&bytes[..bytes.len() / 2]).is_err());
}
