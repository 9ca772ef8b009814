//! Merge rules.
//!
//! A 1 and a 2 combine into a 3. From 3 upward, two equal values combine into
//! their sum. Nothing else merges: 1+1, 2+2 and 1+3 all stay apart.

use serde::{Deserialize, Serialize};

/// Value a wildcard takes when nothing mergeable sits below it.
pub const WILDCARD_FALLBACK: u32 = 3;

/// Check whether two values can merge.
#[must_use]
pub const fn can_merge(a: u32, b: u32) -> bool {
    matches!((a, b), (1, 2) | (2, 1)) || (a == b && a >= 3)
}

/// Value produced by merging `a` and `b`.
///
/// Only meaningful when [`can_merge`] holds.
#[must_use]
pub const fn merged_value(a: u32, b: u32) -> u32 {
    if matches!((a, b), (1, 2) | (2, 1)) {
        3
    } else {
        a.saturating_add(b)
    }
}

/// Check whether a value can appear on a tile: 1, 2 or 3·2^k.
#[must_use]
pub const fn is_valid_tile_value(value: u32) -> bool {
    match value {
        1 | 2 => true,
        v if v % 3 == 0 => (v / 3).is_power_of_two(),
        _ => false,
    }
}

/// Value handed to a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropValue {
    /// A regular numbered tile.
    Number(u32),
    /// Becomes whatever merges with the tile below.
    Wildcard,
}

impl DropValue {
    /// Concrete value for a drop landing on top of `below`.
    #[must_use]
    pub const fn resolve(self, below: Option<u32>) -> u32 {
        match (self, below) {
            (DropValue::Number(value), _) => value,
            (DropValue::Wildcard, Some(1)) => 2,
            (DropValue::Wildcard, Some(2)) => 1,
            (DropValue::Wildcard, Some(value)) if value >= 3 => value,
            (DropValue::Wildcard, _) => WILDCARD_FALLBACK,
        }
    }
}

impl From<u32> for DropValue {
    fn from(value: u32) -> Self {
        DropValue::Number(value)
    }
}

#[cfg(kani)]
mod verification {
    use super::*;

    /// Prove that the merge rules are symmetric.
    #[kani::proof]
    fn prove_merge_symmetric() {
        let a: u32 = kani::any();
        let b: u32 = kani::any();
        assert_eq!(can_merge(a, b), can_merge(b, a));
        assert_eq!(merged_value(a, b), merged_value(b, a));
    }

    /// Prove that a merge of valid values yields a valid value.
    #[kani::proof]
    fn prove_merge_closed() {
        let a: u32 = kani::any();
        let b: u32 = kani::any();
        kani::assume(a <= 3 << 20 && b <= 3 << 20);
        kani::assume(is_valid_tile_value(a) && is_valid_tile_value(b));
        if can_merge(a, b) {
            assert!(is_valid_tile_value(merged_value(a, b)));
        }
    }
}
