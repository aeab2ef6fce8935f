//! The `Reader`/`Writer` split shared by `Llrb`, `Mvcc` and the reference
//! `Dict` oracle, grounded on the teacher's own `Reader`/`Writer` traits
//! (`core.rs`, re-exported from `lib.rs`).

use crate::avgvar::Stats;
use crate::key::{Bound, Key};
use crate::node::Entry;

/// Inclusivity of a bounded range scan's endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inclusion {
    Low,
    High,
    Both,
    None,
}

/// Read-only ordered-map contract shared by `Llrb`, `Mvcc`'s writer and
/// snapshot views, and the `Dict` oracle.
pub trait Reader<K, V>
where
    K: Key,
    V: Clone,
{
    fn len(&self) -> usize;

    fn size(&self) -> usize;

    fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    fn get(&self, key: &K) -> Option<Entry<K, V>>;

    fn min(&self) -> Option<Entry<K, V>>;

    fn max(&self) -> Option<Entry<K, V>>;

    /// Visit every entry within `[low, high]` (inclusivity per `incl`) in
    /// ascending order. `visit` returning `false` halts the scan.
    fn range<F>(&self, low: Bound<K>, high: Bound<K>, incl: Inclusion, visit: F)
    where
        F: FnMut(&Entry<K, V>) -> bool;

    /// Depth at which `key` would be found (or the search terminated
    /// absent), 0 at the root.
    fn get_height(&self, key: &K) -> (Option<Entry<K, V>>, usize);

    /// Mean and standard deviation of leaf depth across the whole tree.
    fn height_stats(&self) -> Stats;
}

/// Mutation contract shared by `Llrb`, `Mvcc`'s writer handle, and `Dict`.
pub trait Writer<K, V>
where
    K: Key,
    V: Clone,
{
    /// Replace-on-equal insert. Returns the previously stored entry, if any.
    fn upsert(&mut self, entry: Entry<K, V>) -> Option<Entry<K, V>>;

    /// Insert without replacing; duplicates remain in the store. The
    /// "replaced" entry is never reported (see DESIGN.md).
    fn insert(&mut self, entry: Entry<K, V>);

    /// Upsert every entry in order; last write wins on duplicate keys.
    fn upsert_bulk(&mut self, entries: Vec<Entry<K, V>>) {
        for entry in entries {
            self.upsert(entry);
        }
    }

    /// Insert every entry in order.
    fn insert_bulk(&mut self, entries: Vec<Entry<K, V>>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    fn delete(&mut self, key: &K) -> Option<Entry<K, V>>;

    fn delete_min(&mut self) -> Option<Entry<K, V>>;

    fn delete_max(&mut self) -> Option<Entry<K, V>>;
}
