use crate::net::{AsId, NodeId};
use crate::path::PathStore;

fn p(ids: &[usize]) -> Vec<NodeId> {
    ids.iter().map(|i| NodeId(*i)).collect()
}

#[test]
fn register_is_idempotent_per_exact_router_sequence() {
    let mut store = PathStore::default();
    let src = AsId(0);
    let dst = AsId(1);

    assert!(store.register(src, dst, p(&[1, 2, 3])));
    assert!(!store.register(src, dst, p(&[1, 2, 3])));
    assert_eq!(store.get(src, dst).len(), 1);

    // 不同序列照常追加，保持注册顺序。
    assert!(store.register(src, dst, p(&[1, 4, 3])));
    assert_eq!(store.get(src, dst), &[p(&[1, 2, 3]), p(&[1, 4, 3])]);
}

#[test]
fn mark_down_returns_every_pair_containing_the_path() {
    let mut store = PathStore::default();
    store.register(AsId(0), AsId(1), p(&[1, 2, 3]));
    store.register(AsId(2), AsId(1), p(&[1, 2, 3]));
    store.register(AsId(0), AsId(2), p(&[9, 8]));

    let affected = store.mark_down(&p(&[1, 2, 3]));
    assert_eq!(affected, vec![(AsId(0), AsId(1)), (AsId(2), AsId(1))]);
    assert!(!store.is_available(&p(&[1, 2, 3])));
    assert!(store.is_available(&p(&[9, 8])));
}

#[test]
fn mark_down_twice_has_the_same_effect_as_once() {
    let mut store = PathStore::default();
    store.register(AsId(0), AsId(1), p(&[1, 2]));

    let first = store.mark_down(&p(&[1, 2]));
    let second = store.mark_down(&p(&[1, 2]));
    assert_eq!(first, second);
    assert!(!store.is_available(&p(&[1, 2])));
}

#[test]
fn mark_down_then_mark_up_restores_availability() {
    let mut store = PathStore::default();
    store.register(AsId(0), AsId(1), p(&[1, 2]));

    store.mark_down(&p(&[1, 2]));
    let affected = store.mark_up(&p(&[1, 2]));
    assert_eq!(affected, vec![(AsId(0), AsId(1))]);
    assert!(store.is_available(&p(&[1, 2])));

    // mark_up 幂等。
    store.mark_up(&p(&[1, 2]));
    assert!(store.is_available(&p(&[1, 2])));
}

#[test]
fn mark_down_on_unknown_path_is_a_noop() {
    let mut store = PathStore::default();
    store.register(AsId(0), AsId(1), p(&[1, 2]));

    let affected = store.mark_down(&p(&[7, 8, 9]));
    assert!(affected.is_empty());
    // 未知路径不会进入不可用集合。
    assert!(store.is_available(&p(&[7, 8, 9])));
}

#[test]
fn pairs_snapshot_is_sorted_and_complete() {
    let mut store = PathStore::default();
    store.register(AsId(3), AsId(0), p(&[1, 2]));
    store.register(AsId(0), AsId(1), p(&[2, 3]));
    assert_eq!(
        store.pairs(),
        vec![(AsId(0), AsId(1)), (AsId(3), AsId(0))]
    );
}
