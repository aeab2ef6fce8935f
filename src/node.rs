//! Node layout and the in-place (mutating) LLRB rebalance primitives.
//!
//! Grounded on `original_source/llrb/llrb.go`'s `Node`/`isRed`/`rotateLeft`/
//! `rotateRight`/`flip`/`moveRedLeft`/`moveRedRight`/`fixUp`, and on the
//! teacher's `Box<Node<K, V>>`-returning rotation signatures in
//! `llrb.rs`.

/// A (key, value) pair held by one tree node.
///
/// Two entries are considered equal ("the same sort position") when
/// neither key is less than the other, per the key's `less` order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Entry<K, V> {
        Entry { key, value }
    }
}

/// A single tree node: one entry, two optional children, and a color bit.
/// New nodes are always red.
pub(crate) struct Node<K, V> {
    pub(crate) entry: Entry<K, V>,
    pub(crate) black: bool,
    pub(crate) left: Option<Box<Node<K, V>>>,
    pub(crate) right: Option<Box<Node<K, V>>>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(entry: Entry<K, V>) -> Box<Node<K, V>> {
        Box::new(Node {
            entry,
            black: false,
            left: None,
            right: None,
        })
    }
}

#[inline]
pub(crate) fn is_red<K, V>(node: &Option<Box<Node<K, V>>>) -> bool {
    node.as_ref().is_some_and(|node| !node.black)
}

/// `rotate_left`: requires `h.right` to be red.
pub(crate) fn rotate_left<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let mut x = h.right.take().expect("rotate_left: right child missing");
    if x.black {
        panic!("rotating a black link");
    }
    h.right = x.left.take();
    x.black = h.black;
    h.black = false;
    x.left = Some(h);
    x
}

/// `rotate_right`: requires `h.left` to be red.
pub(crate) fn rotate_right<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let mut x = h.left.take().expect("rotate_right: left child missing");
    if x.black {
        panic!("rotating a black link");
    }
    h.left = x.right.take();
    x.black = h.black;
    h.black = false;
    x.right = Some(h);
    x
}

/// Inverts the colors of `h` and both of its children. Requires both
/// children to be present.
pub(crate) fn flip<K, V>(h: &mut Node<K, V>) {
    h.black = !h.black;
    let left = h.left.as_mut().expect("flip: left child missing");
    left.black = !left.black;
    let right = h.right.as_mut().expect("flip: right child missing");
    right.black = !right.black;
}

pub(crate) fn move_red_left<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    flip(&mut h);
    if is_red(&h.right.as_ref().unwrap().left) {
        let right = h.right.take().unwrap();
        h.right = Some(rotate_right(right));
        h = rotate_left(h);
        flip(&mut h);
    }
    h
}

pub(crate) fn move_red_right<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    flip(&mut h);
    if is_red(&h.left.as_ref().unwrap().left) {
        h = rotate_right(h);
        flip(&mut h);
    }
    h
}

pub(crate) fn fix_up<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    if is_red(&h.right) {
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

/// Drop a subtree iteratively so deep trees don't blow the call stack on
/// the recursive `Drop` glue `Box<Node<..>>` would otherwise generate.
pub(crate) fn drop_tree<K, V>(node: Box<Node<K, V>>) {
    let mut stack = vec![node];
    while let Some(mut node) = stack.pop() {
        if let Some(left) = node.left.take() {
            stack.push(left);
        }
        if let Some(right) = node.right.take() {
            stack.push(right);
        }
    }
}
