//! `Llrb`, an in-memory ordered key-value store backed by a left-leaning
//! red-black tree. Single-threaded: no operation may overlap another on
//! the same tree.
//!
//! Grounded on `original_source/llrb/llrb.go` (`upsert`/`insert`/
//! `deleteMin`/`deleteMax`/`delete`/`Range`/`GetHeight`/`HeightStats`) and
//! on the teacher's `Box<Node<K, V>>`-returning recursive style in
//! `llrb.rs`/`llrb_node.rs`.

use crate::avgvar::Stats;
use crate::error::{Error, Result};
use crate::key::{Bound, Key};
use crate::node::{
    drop_tree, fix_up, flip, is_red, move_red_left, move_red_right, rotate_left, rotate_right,
    Entry, Node,
};
use crate::traits::{Inclusion, Reader, Writer};

/// An in-memory, single-threaded, ordered key-value store.
pub struct Llrb<K, V> {
    root: Option<Box<Node<K, V>>>,
    count: usize,
    size: usize,
}

impl<K, V> Default for Llrb<K, V> {
    fn default() -> Llrb<K, V> {
        Llrb {
            root: None,
            count: 0,
            size: 0,
        }
    }
}

impl<K, V> Drop for Llrb<K, V> {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            drop_tree(root);
        }
    }
}

impl<K, V> Llrb<K, V> {
    pub fn new() -> Llrb<K, V> {
        Llrb::default()
    }
}

impl<K, V> Llrb<K, V>
where
    K: Key + std::fmt::Debug,
    V: Clone,
{
    /// Walk the whole tree and confirm every invariant in spec.md §8:
    /// no right-leaning reds, no two consecutive reds, equal black-height
    /// on every path, in-order sortedness, and that `len()` matches the
    /// in-order count.
    pub fn validate(&self) -> Result<()> {
        let mut count = 0;
        validate_tree(&self.root, false, 0, &mut count)?;
        if count != self.count {
            return Err(Error::CountMismatch(self.count, count));
        }
        Ok(())
    }
}

fn validate_tree<K, V>(
    node: &Option<Box<Node<K, V>>>,
    from_red: bool,
    mut blacks: usize,
    count: &mut usize,
) -> Result<usize>
where
    K: Key + std::fmt::Debug,
{
    match node {
        None => Ok(blacks),
        Some(node) => {
            let red = !node.black;
            if from_red && red {
                return Err(Error::ConsecutiveReds);
            }
            if !red {
                blacks += 1;
            }
            *count += 1;
            let l = validate_tree(&node.left, red, blacks, count)?;
            let r = validate_tree(&node.right, red, blacks, count)?;
            if l != r {
                return Err(Error::UnbalancedBlacks(l, r));
            }
            // Non-decreasing, not strictly increasing: `insert` keeps
            // duplicate keys in the tree, so a left/right child equal to
            // its parent is valid; only an out-of-order child is not.
            if let Some(left) = node.left.as_ref() {
                if node.entry.key.less(&left.entry.key) {
                    return Err(Error::SortError(
                        format!("{:?}", left.entry.key),
                        format!("{:?}", node.entry.key),
                    ));
                }
            }
            if let Some(right) = node.right.as_ref() {
                if right.entry.key.less(&node.entry.key) {
                    return Err(Error::SortError(
                        format!("{:?}", node.entry.key),
                        format!("{:?}", right.entry.key),
                    ));
                }
            }
            Ok(l)
        }
    }
}

impl<K, V> Reader<K, V> for Llrb<K, V>
where
    K: Key,
    V: Clone,
{
    fn len(&self) -> usize {
        self.count
    }

    fn size(&self) -> usize {
        self.size
    }

    fn get(&self, key: &K) -> Option<Entry<K, V>> {
        get(&self.root, key)
    }

    fn min(&self) -> Option<Entry<K, V>> {
        min(&self.root)
    }

    fn max(&self) -> Option<Entry<K, V>> {
        max(&self.root)
    }

    fn range<F>(&self, low: Bound<K>, high: Bound<K>, incl: Inclusion, mut visit: F)
    where
        F: FnMut(&Entry<K, V>) -> bool,
    {
        range(&self.root, &low, &high, incl, &mut visit);
    }

    fn get_height(&self, key: &K) -> (Option<Entry<K, V>>, usize) {
        get_height(&self.root, key, 0)
    }

    fn height_stats(&self) -> Stats {
        let mut stats = Stats::new();
        height_stats(&self.root, 0, &mut stats);
        stats
    }
}

pub(crate) fn get<K, V>(mut node: &Option<Box<Node<K, V>>>, key: &K) -> Option<Entry<K, V>>
where
    K: Key,
    V: Clone,
{
    while let Some(n) = node {
        if key.less(&n.entry.key) {
            node = &n.left;
        } else if n.entry.key.less(key) {
            node = &n.right;
        } else {
            return Some(n.entry.clone());
        }
    }
    None
}

pub(crate) fn min<K, V>(node: &Option<Box<Node<K, V>>>) -> Option<Entry<K, V>>
where
    K: Clone,
    V: Clone,
{
    let mut node = node.as_ref()?;
    while let Some(left) = node.left.as_ref() {
        node = left;
    }
    Some(node.entry.clone())
}

pub(crate) fn max<K, V>(node: &Option<Box<Node<K, V>>>) -> Option<Entry<K, V>>
where
    K: Clone,
    V: Clone,
{
    let mut node = node.as_ref()?;
    while let Some(right) = node.right.as_ref() {
        node = right;
    }
    Some(node.entry.clone())
}

pub(crate) fn get_height<K, V>(
    node: &Option<Box<Node<K, V>>>,
    key: &K,
    depth: usize,
) -> (Option<Entry<K, V>>, usize)
where
    K: Key,
    V: Clone,
{
    match node {
        None => (None, depth),
        Some(n) => {
            if key.less(&n.entry.key) {
                get_height(&n.left, key, depth + 1)
            } else if n.entry.key.less(key) {
                get_height(&n.right, key, depth + 1)
            } else {
                (Some(n.entry.clone()), depth)
            }
        }
    }
}

pub(crate) fn height_stats<K, V>(node: &Option<Box<Node<K, V>>>, depth: usize, stats: &mut Stats) {
    if let Some(n) = node {
        stats.add(depth as f64);
        height_stats(&n.left, depth + 1, stats);
        height_stats(&n.right, depth + 1, stats);
    }
}

// low/high bound checks for the four inclusivity modes, mirroring
// `rangeFromFind`/`rangeFromTill`/`rangeAfterFind`/`rangeAfterTill` in
// `original_source/llrb/llrb_mvcc.go`.
pub(crate) fn range<K, V, F>(
    node: &Option<Box<Node<K, V>>>,
    low: &Bound<K>,
    high: &Bound<K>,
    incl: Inclusion,
    visit: &mut F,
) -> bool
where
    K: Key,
    V: Clone,
    F: FnMut(&Entry<K, V>) -> bool,
{
    let node = match node {
        None => return true,
        Some(node) => node,
    };
    let key = Bound::Value(node.entry.key.clone());

    let above_high = match incl {
        Inclusion::High | Inclusion::Both => high.less(&key),
        Inclusion::Low | Inclusion::None => !key.less(high),
    };
    if above_high {
        return range(&node.left, low, high, incl, visit);
    }

    let below_low = match incl {
        Inclusion::Low | Inclusion::Both => key.less(low),
        Inclusion::High | Inclusion::None => !low.less(&key),
    };
    if below_low {
        return range(&node.right, low, high, incl, visit);
    }

    if !range(&node.left, low, high, incl, visit) {
        return false;
    }
    if !visit(&node.entry) {
        return false;
    }
    range(&node.right, low, high, incl, visit)
}

impl<K, V> Writer<K, V> for Llrb<K, V>
where
    K: Key,
    V: Clone,
{
    fn upsert(&mut self, entry: Entry<K, V>) -> Option<Entry<K, V>> {
        let size = entry.key.size();
        let root = self.root.take();
        let (root, replaced) = upsert(root, entry);
        let mut root = root;
        root.black = true;
        self.root = Some(root);
        match &replaced {
            None => {
                self.count += 1;
                self.size += size;
            }
            Some(old) => {
                self.size = self.size + size - old.key.size();
            }
        }
        replaced
    }

    fn insert(&mut self, entry: Entry<K, V>) {
        let size = entry.key.size();
        let root = self.root.take();
        let mut root = insert(root, entry);
        root.black = true;
        self.root = Some(root);
        self.count += 1;
        self.size += size;
    }

    fn delete(&mut self, key: &K) -> Option<Entry<K, V>> {
        let root = self.root.take();
        let (root, deleted) = delete(root, key);
        self.root = root.map(|mut r| {
            r.black = true;
            r
        });
        if let Some(entry) = &deleted {
            self.count -= 1;
            self.size -= entry.key.size();
        }
        deleted
    }

    fn delete_min(&mut self) -> Option<Entry<K, V>> {
        let root = self.root.take();
        let (root, deleted) = delete_min(root);
        self.root = root.map(|mut r| {
            r.black = true;
            r
        });
        if let Some(entry) = &deleted {
            self.count -= 1;
            self.size -= entry.key.size();
        }
        deleted
    }

    fn delete_max(&mut self) -> Option<Entry<K, V>> {
        let root = self.root.take();
        let (root, deleted) = delete_max(root);
        self.root = root.map(|mut r| {
            r.black = true;
            r
        });
        if let Some(entry) = &deleted {
            self.count -= 1;
            self.size -= entry.key.size();
        }
        deleted
    }
}

/// Replace-on-equal descent. On an equal comparison, the old entry is
/// swapped out of the node and returned as `replaced`.
pub(crate) fn upsert<K, V>(
    node: Option<Box<Node<K, V>>>,
    entry: Entry<K, V>,
) -> (Box<Node<K, V>>, Option<Entry<K, V>>)
where
    K: Key,
{
    let mut node = match node {
        None => return (Node::new(entry), None),
        Some(node) => node,
    };

    let replaced;
    if entry.key.less(&node.entry.key) {
        let (left, old) = upsert(node.left.take(), entry);
        node.left = Some(left);
        replaced = old;
    } else if node.entry.key.less(&entry.key) {
        let (right, old) = upsert(node.right.take(), entry);
        node.right = Some(right);
        replaced = old;
    } else {
        replaced = Some(std::mem::replace(&mut node.entry, entry));
    }

    (fix_up_23(node), replaced)
}

/// Insert-without-replace: on an equal comparison the new key follows the
/// right branch, so duplicates stay in the tree.
pub(crate) fn insert<K, V>(node: Option<Box<Node<K, V>>>, entry: Entry<K, V>) -> Box<Node<K, V>>
where
    K: Key,
{
    let mut node = match node {
        None => return Node::new(entry),
        Some(node) => node,
    };

    if entry.key.less(&node.entry.key) {
        node.left = Some(insert(node.left.take(), entry));
    } else {
        node.right = Some(insert(node.right.take(), entry));
    }

    fix_up_23(node)
}

/// The 2-3 up-walk shared by `upsert`/`insert`: right-leaning red becomes
/// left-leaning, two left reds in a row get split by a rotation, and a
/// 4-node (both children red) gets color-flipped.
fn fix_up_23<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left(h);
    }
    if is_red(&h.left) && is_red(&h.left.as_ref().unwrap().left) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip(&mut h);
    }
    h
}

pub(crate) fn delete_min<K, V>(
    node: Option<Box<Node<K, V>>>,
) -> (Option<Box<Node<K, V>>>, Option<Entry<K, V>>) {
    let mut h = match node {
        None => return (None, None),
        Some(h) => h,
    };
    if h.left.is_none() {
        return (None, Some(h.entry));
    }

    if !is_red(&h.left) && !is_red(&h.left.as_ref().unwrap().left) {
        h = move_red_left(h);
    }

    let (left, deleted) = delete_min(h.left.take());
    h.left = left;

    (Some(fix_up(h)), deleted)
}

pub(crate) fn delete_max<K, V>(
    node: Option<Box<Node<K, V>>>,
) -> (Option<Box<Node<K, V>>>, Option<Entry<K, V>>) {
    let mut h = match node {
        None => return (None, None),
        Some(h) => h,
    };

    if is_red(&h.left) {
        h = rotate_right(h);
    }
    if h.right.is_none() {
        return (None, Some(h.entry));
    }
    if !is_red(&h.right) && !is_red(&h.right.as_ref().unwrap().left) {
        h = move_red_right(h);
    }

    let (right, deleted) = delete_max(h.right.take());
    h.right = right;

    (Some(fix_up(h)), deleted)
}

pub(crate) fn delete<K, V>(
    node: Option<Box<Node<K, V>>>,
    key: &K,
) -> (Option<Box<Node<K, V>>>, Option<Entry<K, V>>)
where
    K: Key,
{
    let mut h = match node {
        None => return (None, None),
        Some(h) => h,
    };

    let deleted;
    if key.less(&h.entry.key) {
        if h.left.is_none() {
            return (Some(h), None);
        }
        if !is_red(&h.left) && !is_red(&h.left.as_ref().unwrap().left) {
            h = move_red_left(h);
        }
        let (left, old) = delete(h.left.take(), key);
        h.left = left;
        deleted = old;
    } else {
        if is_red(&h.left) {
            h = rotate_right(h);
        }
        if !h.entry.key.less(key) && h.right.is_none() {
            return (None, Some(h.entry));
        }
        if h.right.is_some()
            && !is_red(&h.right)
            && !is_red(&h.right.as_ref().unwrap().left)
        {
            h = move_red_right(h);
        }
        if !h.entry.key.less(key) {
            let (right, min_entry) = delete_min(h.right.take());
            h.right = right;
            let min_entry = min_entry.expect("delete: splice found no minimum on the right");
            deleted = Some(std::mem::replace(&mut h.entry, min_entry));
        } else {
            let (right, old) = delete(h.right.take(), key);
            h.right = right;
            deleted = old;
        }
    }

    (Some(fix_up(h)), deleted)
}

#[path = "llrb_test.rs"]
#[cfg(test)]
mod llrb_test;
