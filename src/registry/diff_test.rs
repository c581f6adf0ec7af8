use crate::registry::DiffContainer;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_diff_interleaved() {
    let old_list = names(&["a", "b", "d"]);
    let new_list = names(&["b", "c", "d"]);
    let container = DiffContainer::new(&old_list, &new_list);
    assert_eq!(container.added(), names(&["c"]));
    assert_eq!(container.deleted(), names(&["a"]));
}

#[test]
fn test_diff_empty_previous() {
    let container = DiffContainer::new(&names(&[]), &names(&["a", "b"]));
    assert_eq!(container.added(), names(&["a", "b"]));
    assert!(container.deleted().is_empty());
}

#[test]
fn test_diff_empty_current() {
    let container = DiffContainer::new(&names(&["a", "b"]), &names(&[]));
    assert!(container.added().is_empty());
    assert_eq!(container.deleted(), names(&["a", "b"]));
}

#[test]
fn test_diff_identical() {
    let list = names(&["a", "b", "c"]);
    let container = DiffContainer::new(&list, &list);
    assert!(container.added().is_empty());
    assert!(container.deleted().is_empty());
}

#[test]
fn test_diff_disjoint() {
    let container = DiffContainer::new(&names(&["a", "c"]), &names(&["b", "d"]));
    assert_eq!(container.added(), names(&["b", "d"]));
    assert_eq!(container.deleted(), names(&["a", "c"]));
}

#[test]
fn test_diff_trailing_tails() {
    let container = DiffContainer::new(&names(&["a", "b"]), &names(&["a", "b", "x", "y"]));
    assert_eq!(container.added(), names(&["x", "y"]));
    assert!(container.deleted().is_empty());
}

#[test]
fn test_diff_partitions_union() {
    // added ∪ common ∪ deleted partitions the union; added/deleted disjoint.
    let old_list = names(&["0000000001", "0000000003", "0000000004"]);
    let new_list = names(&["0000000002", "0000000003", "0000000005"]);
    let container = DiffContainer::new(&old_list, &new_list);

    for added in container.added() {
        assert!(new_list.contains(added) && !old_list.contains(added));
        assert!(!container.deleted().contains(added));
    }
    for deleted in container.deleted() {
        assert!(old_list.contains(deleted) && !new_list.contains(deleted));
    }
    let common: Vec<_> = old_list.iter().filter(|e| new_list.contains(e)).collect();
    assert_eq!(
        container.added().len() + container.deleted().len() + 2 * common.len(),
        old_list.len() + new_list.len()
    );
}
