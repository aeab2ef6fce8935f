//! `Dict`: an unordered reference oracle exposing the same `Reader`/
//! `Writer` contract as the trees, so the validation harness can compare
//! tree behavior against a trivial `HashMap`-backed implementation.
//!
//! Grounded on `original_source/llrb/dict.go`. Ordered operations
//! (`min`/`max`/`delete_min`/`delete_max`/`range`) materialize a sorted
//! key list on demand rather than maintaining one incrementally, exactly
//! as the Go original's `sorted()` helper does.

use std::collections::HashMap;
use std::hash::Hash;

use crate::avgvar::Stats;
use crate::key::{Bound, Key};
use crate::node::Entry;
use crate::traits::{Inclusion, Reader, Writer};

/// An unordered oracle over `K: Key + Eq + Hash`, used to cross-check a
/// tree's behavior in the validation harness.
#[derive(Clone, Default)]
pub struct Dict<K, V> {
    map: HashMap<K, V>,
    size: usize,
}

impl<K, V> Dict<K, V>
where
    K: Key + Eq + Hash,
{
    pub fn new() -> Dict<K, V> {
        Dict {
            map: HashMap::new(),
            size: 0,
        }
    }

    fn sorted(&self) -> Vec<K> {
        let mut keys: Vec<K> = self.map.keys().cloned().collect();
        keys.sort_by(|a, b| {
            if a.less(b) {
                std::cmp::Ordering::Less
            } else if b.less(a) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        keys
    }
}

impl<K, V> Reader<K, V> for Dict<K, V>
where
    K: Key + Eq + Hash,
    V: Clone,
{
    fn len(&self) -> usize {
        self.map.len()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn get(&self, key: &K) -> Option<Entry<K, V>> {
        self.map
            .get(key)
            .map(|value| Entry::new(key.clone(), value.clone()))
    }

    fn min(&self) -> Option<Entry<K, V>> {
        let keys = self.sorted();
        let key = keys.first()?;
        self.get(key)
    }

    fn max(&self) -> Option<Entry<K, V>> {
        let keys = self.sorted();
        let key = keys.last()?;
        self.get(key)
    }

    fn range<F>(&self, low: Bound<K>, high: Bound<K>, incl: Inclusion, mut visit: F)
    where
        F: FnMut(&Entry<K, V>) -> bool,
    {
        for key in self.sorted() {
            let bound = Bound::Value(key.clone());

            let above_high = match incl {
                Inclusion::High | Inclusion::Both => high.less(&bound),
                Inclusion::Low | Inclusion::None => !bound.less(&high),
            };
            if above_high {
                continue;
            }
            let below_low = match incl {
                Inclusion::Low | Inclusion::Both => bound.less(&low),
                Inclusion::High | Inclusion::None => !low.less(&bound),
            };
            if below_low {
                continue;
            }

            let entry = self.get(&key).expect("sorted key must be present");
            if !visit(&entry) {
                return;
            }
        }
    }

    fn get_height(&self, key: &K) -> (Option<Entry<K, V>>, usize) {
        (self.get(key), 0)
    }

    fn height_stats(&self) -> Stats {
        Stats::new()
    }
}

impl<K, V> Writer<K, V> for Dict<K, V>
where
    K: Key + Eq + Hash,
    V: Clone,
{
    fn upsert(&mut self, entry: Entry<K, V>) -> Option<Entry<K, V>> {
        let key_size = entry.key.size();
        match self.map.insert(entry.key.clone(), entry.value) {
            Some(old_value) => Some(Entry::new(entry.key, old_value)),
            None => {
                self.size += key_size;
                None
            }
        }
    }

    /// Matches the Go original literally: every `insert` bumps `size` by
    /// the key's size, even when the key already existed (a `HashMap`
    /// cannot hold true duplicates, so this inflates `size()` relative to
    /// a tree that really does keep duplicate keys around; see
    /// DESIGN.md).
    fn insert(&mut self, entry: Entry<K, V>) {
        self.size += entry.key.size();
        self.map.insert(entry.key, entry.value);
    }

    fn delete(&mut self, key: &K) -> Option<Entry<K, V>> {
        if self.map.is_empty() {
            return None;
        }
        self.map.remove(key).map(|value| {
            self.size -= key.size();
            Entry::new(key.clone(), value)
        })
    }

    fn delete_min(&mut self) -> Option<Entry<K, V>> {
        let key = self.min()?.key;
        self.delete(&key)
    }

    fn delete_max(&mut self) -> Option<Entry<K, V>> {
        let key = self.max()?.key;
        self.delete(&key)
    }
}

#[path = "dict_test.rs"]
#[cfg(test)]
mod dict_test;
