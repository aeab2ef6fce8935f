//! The totally-ordered, sized key abstraction every tree in this crate is
//! generic over, plus the `Ninf`/`Pinf` sentinels used as open range bounds.

/// A totally ordered, sized value usable as a tree key.
///
/// `less` must be a strict total order: irreflexive, antisymmetric and
/// transitive. `size` is a non-negative byte-size estimate folded into a
/// tree's cumulative [`crate::llrb::Llrb::size`].
pub trait Key: Clone {
    /// Strict less-than. Implementations must never return true for
    /// `x.less(&x)`.
    fn less(&self, other: &Self) -> bool;

    /// Byte-size estimate of this key, used for `Tree::size()`.
    fn size(&self) -> usize;
}

/// A key extended with the `Ninf`/`Pinf` sentinels, so range bounds can be
/// expressed uniformly as `Bound<K>` without an `Option` wrapper at the
/// comparison sites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bound<K> {
    NegInf,
    Value(K),
    PosInf,
}

impl<K: Key> Bound<K> {
    /// `self.less(other)` lifted to sentinel-aware comparison.
    pub fn less(&self, other: &Bound<K>) -> bool {
        match (self, other) {
            (Bound::NegInf, Bound::NegInf) => false,
            (Bound::NegInf, _) => true,
            (_, Bound::PosInf) => !matches!(self, Bound::PosInf),
            (Bound::PosInf, _) => false,
            (Bound::Value(a), Bound::Value(b)) => a.less(b),
            (Bound::Value(_), Bound::NegInf) => false,
        }
    }
}

/// `inf(sign)`: returns a key greater than every user key when `sign > 0`,
/// and less than every user key when `sign < 0`. `sign == 0` is a
/// programmer error.
pub fn inf<K>(sign: i32) -> Bound<K> {
    if sign > 0 {
        Bound::PosInf
    } else if sign < 0 {
        Bound::NegInf
    } else {
        panic!("inf: sign must not be zero")
    }
}

impl Key for i64 {
    fn less(&self, other: &Self) -> bool {
        self < other
    }

    fn size(&self) -> usize {
        8
    }
}

impl Key for String {
    fn less(&self, other: &Self) -> bool {
        self < other
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl Key for Vec<u8> {
    fn less(&self, other: &Self) -> bool {
        self < other
    }

    fn size(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod key_test {
    use super::*;

    #[test]
    fn test_i64_less() {
        assert!(1i64.less(&2));
        assert!(!2i64.less(&1));
        assert!(!1i64.less(&1));
    }

    #[test]
    fn test_string_less() {
        assert!("a".to_string().less(&"b".to_string()));
        assert!(!"b".to_string().less(&"a".to_string()));
    }

    #[test]
    fn test_ninf_pinf() {
        let ninf: Bound<i64> = inf(-1);
        let pinf: Bound<i64> = inf(1);
        assert!(ninf.less(&Bound::Value(i64::MIN)));
        assert!(Bound::Value(i64::MAX).less(&pinf));
        assert!(!pinf.less(&Bound::Value(i64::MAX)));
        assert!(!ninf.less(&ninf));
    }

    #[test]
    #[should_panic]
    fn test_inf_zero_panics() {
        let _: Bound<i64> = inf(0);
    }
}
