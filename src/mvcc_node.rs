//! Node layout and copy-on-write rebalance primitives for the MVCC tree.
//!
//! Grounded on `original_source/llrb/llrb_mvcc.go`'s `Node`/`cow`/
//! `rotateLeftCOW`/`rotateRightCOW`/`flipCOW`/`moveRedLeftCOW`/
//! `moveRedRightCOW`/`fixUpCOW`/`walkUpRot23COW`. Children are `Arc` rather
//! than `Box`: path-copying a write must leave every untouched sibling
//! subtree shared between the old and new tree versions, which a `Box`'s
//! single ownership cannot express.

use std::sync::Arc;

use crate::node::Entry;

/// A tree node shared, via `Arc`, across every version of the tree that
/// reaches it unchanged.
pub(crate) struct Node<K, V> {
    pub(crate) entry: Entry<K, V>,
    pub(crate) black: bool,
    pub(crate) left: Option<Arc<Node<K, V>>>,
    pub(crate) right: Option<Arc<Node<K, V>>>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn leaf(entry: Entry<K, V>) -> Node<K, V> {
        Node {
            entry,
            black: false,
            left: None,
            right: None,
        }
    }
}

/// Dropping a node whose children are still referenced by an open snapshot
/// must not touch them; only a child this was the last owner of gets
/// walked further, iteratively, to avoid recursive `Drop` glue on deep
/// private (unshared) trees.
impl<K, V> Drop for Node<K, V> {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        if let Some(left) = self.left.take() {
            stack.push(left);
        }
        if let Some(right) = self.right.take() {
            stack.push(right);
        }
        while let Some(arc) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(arc) {
                if let Some(left) = node.left.take() {
                    stack.push(left);
                }
                if let Some(right) = node.right.take() {
                    stack.push(right);
                }
            }
        }
    }
}

#[inline]
pub(crate) fn is_red<K, V>(node: &Option<Arc<Node<K, V>>>) -> bool {
    node.as_ref().is_some_and(|node| !node.black)
}

/// Shallow copy: a fresh node owning clones of the entry and of the
/// (shared) child pointers. Mirrors the Go original's `cow`.
pub(crate) fn cow<K: Clone, V: Clone>(node: &Node<K, V>) -> Node<K, V> {
    Node {
        entry: node.entry.clone(),
        black: node.black,
        left: node.left.clone(),
        right: node.right.clone(),
    }
}

/// `rotate_left_cow`: requires `h.right` to be red. `h` is an owned node
/// private to the in-flight write (already copied by the caller); its
/// right child is shared and must be copied before mutation.
pub(crate) fn rotate_left_cow<K, V>(
    mut h: Node<K, V>,
    reclaim: &mut Vec<Arc<Node<K, V>>>,
) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    let x_arc = h.right.take().expect("rotate_left_cow: right child missing");
    reclaim.push(Arc::clone(&x_arc));
    if x_arc.black {
        panic!("rotating a black link");
    }
    let mut x = cow(&x_arc);
    h.right = x.left.take();
    x.black = h.black;
    h.black = false;
    x.left = Some(Arc::new(h));
    x
}

/// `rotate_right_cow`: requires `h.left` to be red.
pub(crate) fn rotate_right_cow<K, V>(
    mut h: Node<K, V>,
    reclaim: &mut Vec<Arc<Node<K, V>>>,
) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    let x_arc = h.left.take().expect("rotate_right_cow: left child missing");
    reclaim.push(Arc::clone(&x_arc));
    if x_arc.black {
        panic!("rotating a black link");
    }
    let mut x = cow(&x_arc);
    h.left = x.right.take();
    x.black = h.black;
    h.black = false;
    x.right = Some(Arc::new(h));
    x
}

/// Inverts the colors of `h` and both of its children, copying both
/// children first since they are shared with older tree versions.
pub(crate) fn flip_cow<K, V>(mut h: Node<K, V>, reclaim: &mut Vec<Arc<Node<K, V>>>) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    h.black = !h.black;

    let left_arc = h.left.take().expect("flip_cow: left child missing");
    reclaim.push(Arc::clone(&left_arc));
    let mut left = cow(&left_arc);
    left.black = !left.black;
    h.left = Some(Arc::new(left));

    let right_arc = h.right.take().expect("flip_cow: right child missing");
    reclaim.push(Arc::clone(&right_arc));
    let mut right = cow(&right_arc);
    right.black = !right.black;
    h.right = Some(Arc::new(right));

    h
}

pub(crate) fn move_red_left_cow<K, V>(
    mut h: Node<K, V>,
    reclaim: &mut Vec<Arc<Node<K, V>>>,
) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    h = flip_cow(h, reclaim);
    if is_red(&h.right.as_ref().unwrap().left) {
        // `h.right` was just minted by `flip_cow` above and is not yet
        // reachable from any published tree, so reclaiming it would be
        // meaningless; reclaim only happens for children copied away from
        // a still-shared node, as in `rotate_right_cow`/`rotate_left_cow`.
        let right_arc = h.right.take().unwrap();
        let right = Arc::try_unwrap(right_arc).unwrap_or_else(|arc| cow(&arc));
        let rotated = rotate_right_cow(right, reclaim);
        h.right = Some(Arc::new(rotated));
        h = rotate_left_cow(h, reclaim);
        h = flip_cow(h, reclaim);
    }
    h
}

pub(crate) fn move_red_right_cow<K, V>(
    mut h: Node<K, V>,
    reclaim: &mut Vec<Arc<Node<K, V>>>,
) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    h = flip_cow(h, reclaim);
    if is_red(&h.left.as_ref().unwrap().left) {
        h = rotate_right_cow(h, reclaim);
        h = flip_cow(h, reclaim);
    }
    h
}

/// Up-walk used by delete's splice/fix path.
pub(crate) fn fix_up_cow<K, V>(mut h: Node<K, V>, reclaim: &mut Vec<Arc<Node<K, V>>>) -> Arc<Node<K, V>>
where
    K: Clone,
    V: Clone,
{
    if is_red(&h.right) {
        h = rotate_left_cow(h, reclaim);
    }
    if is_red(&h.left) && is_red(&h.left.as_ref().unwrap().left) {
        h = rotate_right_cow(h, reclaim);
    }
    if is_red(&h.left) && is_red(&h.right) {
        h = flip_cow(h, reclaim);
    }
    Arc::new(h)
}

/// Up-walk used by `upsert`/`insert`'s 2-3 rebalancing (an extra
/// `!is_red(left)` guard on the left-leaning check, matching the
/// non-MVCC tree's `fix_up_23`).
pub(crate) fn fix_up_23_cow<K, V>(
    mut h: Node<K, V>,
    reclaim: &mut Vec<Arc<Node<K, V>>>,
) -> Arc<Node<K, V>>
where
    K: Clone,
    V: Clone,
{
    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left_cow(h, reclaim);
    }
    if is_red(&h.left) && is_red(&h.left.as_ref().unwrap().left) {
        h = rotate_right_cow(h, reclaim);
    }
    if is_red(&h.left) && is_red(&h.right) {
        h = flip_cow(h, reclaim);
    }
    Arc::new(h)
}
