use rand::prelude::random;

use super::*;
use crate::key::inf;

#[test]
fn test_empty_tree() {
    let tree: Llrb<i64, i64> = Llrb::new();
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.size(), 0);
    assert_eq!(tree.min(), None);
    assert_eq!(tree.max(), None);
    assert_eq!(tree.get(&10), None);
    tree.validate().unwrap();
}

#[test]
fn test_upsert_overwrites() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    assert_eq!(tree.upsert(Entry::new(10, 100)), None);
    assert_eq!(tree.upsert(Entry::new(10, 200)), Some(Entry::new(10, 100)));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(&10), Some(Entry::new(10, 200)));
    tree.validate().unwrap();
}

#[test]
fn test_insert_keeps_duplicates() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    tree.insert(Entry::new(10, 1));
    tree.insert(Entry::new(10, 2));
    tree.insert(Entry::new(10, 3));
    assert_eq!(tree.len(), 3);
    tree.validate().unwrap();
}

#[test]
fn test_duplicate_insert_then_delete_cycle() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for _ in 0..5 {
        tree.insert(Entry::new(42, 1));
    }
    assert_eq!(tree.len(), 5);
    for _ in 0..5 {
        assert_eq!(tree.delete(&42), Some(Entry::new(42, 1)));
    }
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.delete(&42), None);
    tree.validate().unwrap();
}

#[test]
fn test_reverse_order_upsert_and_bounded_range() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in (0..100).rev() {
        tree.upsert(Entry::new(key, key * 10));
    }
    tree.validate().unwrap();

    let mut got = Vec::new();
    tree.range(Bound::Value(20), Bound::Value(30), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, (20..=30).collect::<Vec<_>>());
}

#[test]
fn test_string_key_half_open_range() {
    let mut tree: Llrb<String, i64> = Llrb::new();
    for key in ["aa", "ab", "ac", "ad", "b"] {
        tree.upsert(Entry::new(key.to_string(), 0));
    }
    let mut got = Vec::new();
    tree.range(
        Bound::Value("ab".to_string()),
        Bound::Value("ac".to_string()),
        Inclusion::Low,
        |e| {
            got.push(e.key.clone());
            true
        },
    );
    assert_eq!(got, vec!["ab".to_string()]);
}

#[test]
fn test_scenario_3_string_key_range_with_prefixes_and_punctuation() {
    let mut tree: Llrb<String, i64> = Llrb::new();
    for key in ["ab", "aba", "abc", "a", "aa", "aaa", "b", "a-", "a!"] {
        tree.upsert(Entry::new(key.to_string(), 0));
    }
    tree.validate().unwrap();

    let mut got = Vec::new();
    tree.range(
        Bound::Value("ab".to_string()),
        Bound::Value("ac".to_string()),
        Inclusion::Low,
        |e| {
            got.push(e.key.clone());
            true
        },
    );
    assert_eq!(
        got,
        vec!["ab".to_string(), "aba".to_string(), "abc".to_string()]
    );
}

#[test]
fn test_full_range_with_sentinels() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in [5, 1, 9, 3, 7] {
        tree.upsert(Entry::new(key, 0));
    }
    let mut got = Vec::new();
    tree.range(inf(-1), inf(1), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, vec![1, 3, 5, 7, 9]);
}

#[test]
fn test_low_equals_high_exact_match() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in 0..20 {
        tree.upsert(Entry::new(key, 0));
    }
    let mut got = Vec::new();
    tree.range(Bound::Value(10), Bound::Value(10), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, vec![10]);

    got.clear();
    tree.range(Bound::Value(10), Bound::Value(10), Inclusion::None, |e| {
        got.push(e.key);
        true
    });
    assert!(got.is_empty());
}

#[test]
fn test_delete_of_never_inserted_key() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    tree.upsert(Entry::new(1, 1));
    assert_eq!(tree.delete(&999), None);
    assert_eq!(tree.len(), 1);
    tree.validate().unwrap();
}

#[test]
fn test_scenario_5_delete_absent_key_then_drain_all_inserted() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    let mut keys: Vec<i64> = (0..100).map(|_| random::<i64>() % 1_000_000).collect();
    keys.sort_unstable();
    keys.dedup();
    for &key in &keys {
        tree.upsert(Entry::new(key, key));
    }
    tree.validate().unwrap();

    let never_inserted = keys.last().copied().unwrap_or(0) + 1_000_000;
    assert_eq!(tree.delete(&never_inserted), None);
    assert_eq!(tree.len(), keys.len());

    for &key in &keys {
        assert_eq!(tree.delete(&key), Some(Entry::new(key, key)));
    }
    assert_eq!(tree.len(), 0);
    tree.validate().unwrap();
}

#[test]
fn test_scenario_6_sparse_interior_delete_leaves_only_endpoints() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in 0..=99 {
        tree.upsert(Entry::new(key, key));
    }
    for key in 1..=98 {
        tree.delete(&key);
    }
    tree.validate().unwrap();

    let mut got = Vec::new();
    tree.range(inf(-1), inf(1), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    assert_eq!(got, vec![0, 99]);
}

#[test]
fn test_sparse_delete_leaves_range_consistent() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in 0..50 {
        tree.upsert(Entry::new(key, key));
    }
    for key in (0..50).step_by(3) {
        tree.delete(&key);
    }
    tree.validate().unwrap();

    let mut got = Vec::new();
    tree.range(inf(-1), inf(1), Inclusion::Both, |e| {
        got.push(e.key);
        true
    });
    let expect: Vec<i64> = (0..50).filter(|k| k % 3 != 0).collect();
    assert_eq!(got, expect);
}

#[test]
fn test_thousand_random_inserts_then_ascending_delete() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    let mut keys: Vec<i64> = (0..1000).map(|_| random::<i64>() % 10_000).collect();
    for &key in &keys {
        tree.upsert(Entry::new(key, key));
    }
    tree.validate().unwrap();

    keys.sort_unstable();
    keys.dedup();
    for key in &keys {
        assert_eq!(tree.delete_min().unwrap().key, *key);
    }
    assert_eq!(tree.len(), 0);
    tree.validate().unwrap();
}

#[test]
fn test_delete_min_max_drain_tree() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in 0..200 {
        tree.upsert(Entry::new(key, key));
    }
    let mut seen_min = Vec::new();
    let mut seen_max = Vec::new();
    for _ in 0..100 {
        seen_min.push(tree.delete_min().unwrap().key);
        seen_max.push(tree.delete_max().unwrap().key);
        tree.validate().unwrap();
    }
    assert_eq!(tree.len(), 0);
    assert_eq!(seen_min, (0..100).collect::<Vec<_>>());
    assert_eq!(seen_max, (100..200).rev().collect::<Vec<_>>());
}

#[test]
fn test_height_stats_nonzero_after_inserts() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in 0..256 {
        tree.upsert(Entry::new(key, key));
    }
    let stats = tree.height_stats();
    assert_eq!(stats.count(), 256);
    assert!(stats.mean() > 0.0);
}

#[test]
fn test_get_height_matches_depth_of_lookup() {
    let mut tree: Llrb<i64, i64> = Llrb::new();
    for key in 0..64 {
        tree.upsert(Entry::new(key, key));
    }
    let (entry, depth) = tree.get_height(&32);
    assert_eq!(entry.unwrap().key, 32);
    assert!(depth < 64);
    let (entry, _) = tree.get_height(&9999);
    assert_eq!(entry, None);
}
