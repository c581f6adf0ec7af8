use std::collections::HashMap;

use crate::ConfigOverrides;

#[test]
fn test_merge_remote_wins() {
    let overrides = ConfigOverrides::default();
    overrides.set("timeout", "3000");
    overrides.set("tag", "stable");

    let mut remote = HashMap::new();
    remote.insert("timeout".to_string(), "5000".to_string());
    remote.insert("retry".to_string(), "2".to_string());
    overrides.merge(remote);

    assert_eq!(overrides.get("timeout"), Some("5000".to_string()));
    assert_eq!(overrides.get("tag"), Some("stable".to_string()));
    assert_eq!(overrides.get("retry"), Some("2".to_string()));
}

#[test]
fn test_snapshot_is_detached() {
    let overrides = ConfigOverrides::default();
    overrides.set("a", "1");
    let snapshot = overrides.snapshot();
    overrides.set("a", "2");

    assert_eq!(snapshot.get("a"), Some(&"1".to_string()));
    assert_eq!(overrides.get("a"), Some("2".to_string()));
}

#[test]
fn test_merge_convergence_between_two_participants() {
    // Two participants each publish one override; after each merges the
    // other's snapshot once, both views are equal.
    let left = ConfigOverrides::default();
    let right = ConfigOverrides::default();
    left.set("left.key", "l");
    right.set("right.key", "r");

    left.merge(right.snapshot());
    right.merge(left.snapshot());

    assert_eq!(left.snapshot(), right.snapshot());
}
