// Boundary behaviors from spec.md §8: degenerate intervals, shared
// endpoints, an empty index, and MAX_LEVEL saturation.

use interval_skiplist::{Interval, IntervalSkipList, Options, MAX_LEVEL};

#[test]
fn degenerate_interval_matches_only_its_own_point() {
    let mut list = IntervalSkipList::with_seed(201);
    list.insert(Interval::new_handle(42, 42, "solo").unwrap()).unwrap();

    let mut out = Vec::new();
    list.find(&42, &mut out);
    assert_eq!(out.len(), 1);

    out.clear();
    list.find(&41, &mut out);
    assert!(out.is_empty());

    out.clear();
    list.find(&43, &mut out);
    assert!(out.is_empty());
}

#[test]
fn shared_endpoint_node_survives_until_both_owners_leave() {
    let mut list = IntervalSkipList::with_seed(202);
    let a = Interval::new_handle(5, 10, "a").unwrap();
    let b = Interval::new_handle(5, 20, "b").unwrap();
    list.insert(a.clone()).unwrap();
    list.insert(b.clone()).unwrap();
    assert!(list.contains_key(&5));

    list.remove(&a).unwrap();
    assert!(list.contains_key(&5), "node must survive while b still owns key 5");

    list.remove(&b).unwrap();
    assert!(!list.contains_key(&5));
}

#[test]
fn empty_index_returns_empty_for_every_key() {
    let list: IntervalSkipList<i32, &str> = IntervalSkipList::new();
    for k in [-100, -1, 0, 1, 100] {
        let mut out = Vec::new();
        list.find(&k, &mut out);
        assert!(out.is_empty());
    }
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
}

#[test]
fn max_level_saturation_does_not_panic() {
    let options = Options {
        max_level: 3,
        promotion_probability: 0.95,
        seed: Some(99),
    };
    let mut list: IntervalSkipList<i32, &str> = IntervalSkipList::with_options(options);
    for k in 0..500 {
        list.insert(Interval::new_handle(k, k, "x").unwrap()).unwrap();
    }
    assert!(list.stats().max_level <= 3);
    assert!(list.stats().max_level <= MAX_LEVEL);
}
