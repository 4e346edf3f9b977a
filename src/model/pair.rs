use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical key for the unordered pair of groups a relation belongs to.
///
/// `low < high` always holds. [`PairKey::new`] is the only constructor that
/// callers should use, so `{a, b}` and `{b, a}` can never produce two keys.
/// Ordering is lexicographic on `(low, high)`, which gives every registry walk
/// a deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub low: u64,
    pub high: u64,
}

impl PairKey {
    /// Canonicalize `{a, b}`. Returns `None` for `a == b`: a group never holds a
    /// relation with itself.
    pub fn new(a: u64, b: u64) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, group: u64) -> bool {
        self.low == group || self.high == group
    }

    /// The group on the other side of the pair, if `group` is a member.
    pub fn other(&self, group: u64) -> Option<u64> {
        if group == self.low {
            Some(self.high)
        } else if group == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn groups(&self) -> [u64; 2] {
        [self.low, self.high]
    }

    /// True when the stored fields are already in canonical order. Snapshots
    /// restored from disk are checked with this.
    pub fn is_canonical(&self) -> bool {
        self.low < self.high
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_of_arguments_does_not_matter() {
        assert_eq!(PairKey::new(7, 3), PairKey::new(3, 7));
        let key = PairKey::new(7, 3).unwrap();
        assert_eq!(key.low, 3);
        assert_eq!(key.high, 7);
        assert!(key.is_canonical());
    }

    #[test]
    fn self_pair_is_rejected() {
        assert!(PairKey::new(4, 4).is_none());
    }

    #[test]
    fn other_side_of_pair() {
        let key = PairKey::new(1, 2).unwrap();
        assert_eq!(key.other(1), Some(2));
        assert_eq!(key.other(2), Some(1));
        assert_eq!(key.other(3), None);
        assert!(key.contains(2));
        assert!(!key.contains(5));
    }

    #[test]
    fn display_joins_sorted_ids() {
        assert_eq!(PairKey::new(9, 2).unwrap().to_string(), "2-9");
    }
}
