use super::*;
use crate::key::inf;

#[test]
fn test_empty_dict() {
    let dict: Dict<i64, i64> = Dict::new();
    assert_eq!(dict.len(), 0);
    assert_eq!(dict.min(), None);
    assert_eq!(dict.max(), None);
}

#[test]
fn test_upsert_returns_previous() {
    let mut dict: Dict<i64, i64> = Dict::new();
    assert_eq!(dict.upsert(Entry::new(1, 10)), None);
    assert_eq!(dict.upsert(Entry::new(1, 20)), Some(Entry::new(1, 10)));
    assert_eq!(dict.get(&1), Some(Entry::new(1, 20)));
}

#[test]
fn test_insert_overwrites_without_reporting() {
    let mut dict: Dict<i64, i64> = Dict::new();
    dict.insert(Entry::new(1, 10));
    dict.insert(Entry::new(1, 20));
    assert_eq!(dict.len(), 1);
    assert_eq!(dict.get(&1), Some(Entry::new(1, 20)));
}

#[test]
fn test_min_max_on_ordered_view() {
    let mut dict: Dict<i64, i64> = Dict::new();
    for key in [5, 1, 9, 3, 7] {
        dict.upsert(Entry::new(key, key));
    }
    assert_eq!(dict.min().unwrap().key, 1);
    assert_eq!(dict.max().unwrap().key, 9);
}

#[test]
fn test_delete_min_and_max_use_correct_keys() {
    let mut dict: Dict<i64, i64> = Dict::new();
    for key in 0..10 {
        dict.upsert(Entry::new(key, key));
    }
    assert_eq!(dict.delete_min().unwrap().key, 0);
    assert_eq!(dict.delete_max().unwrap().key, 9);
    assert_eq!(dict.len(), 8);
}

#[test]
fn test_range_matches_inclusivity_modes() {
    let mut dict: Dict<i64, i64> = Dict::new();
    for key in 0..20 {
        dict.upsert(Entry::new(key, key));
    }
    let mut got = Vec::new();
    dict.range(Bound::Value(5), Bound::Value(10), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, (5..=10).collect::<Vec<_>>());

    got.clear();
    dict.range(Bound::Value(5), Bound::Value(10), Inclusion::None, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, (6..10).collect::<Vec<_>>());
}

#[test]
fn test_range_with_sentinels_visits_everything() {
    let mut dict: Dict<i64, i64> = Dict::new();
    for key in [5, 1, 9, 3, 7] {
        dict.upsert(Entry::new(key, 0));
    }
    let mut got = Vec::new();
    dict.range(inf(-1), inf(1), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, vec![1, 3, 5, 7, 9]);
}

#[test]
fn test_clone_is_independent() {
    let mut dict: Dict<i64, i64> = Dict::new();
    dict.upsert(Entry::new(1, 1));
    let snapshot = dict.clone();
    dict.upsert(Entry::new(1, 2));
    dict.upsert(Entry::new(2, 2));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(&1), Some(Entry::new(1, 1)));
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get(&1), Some(Entry::new(1, 2)));
}

#[test]
fn test_delete_of_absent_key() {
    let mut dict: Dict<i64, i64> = Dict::new();
    dict.upsert(Entry::new(1, 1));
    assert_eq!(dict.delete(&999), None);
    assert_eq!(dict.len(), 1);
}
