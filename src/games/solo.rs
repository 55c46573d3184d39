//! Independent game content (matching, memory, sorting)
//!
//! These games are played entirely client-side, one private copy per
//! participant: the adapter passes the content through unmodified,
//! performs no synchronization, and never patches the session document.
//! Because nothing is shared, a random local shuffle is permitted here,
//! unlike on cooperative boards.

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One left/right pair in a matching game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MatchPair {
    /// The left-hand item
    #[garde(length(chars, min = 1, max = crate::constants::solo::MAX_ITEM_LENGTH))]
    pub left: String,
    /// The right-hand item it matches
    #[garde(length(chars, min = 1, max = crate::constants::solo::MAX_ITEM_LENGTH))]
    pub right: String,
}

/// Static content of an independent matching game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MatchingContent {
    /// The pairs to match up
    #[garde(length(min = 1, max = crate::constants::solo::MAX_ITEMS_COUNT), dive)]
    pub pairs: Vec<MatchPair>,
}

/// Static content of an independent memory game
///
/// Each card appears twice on the board; the duplication happens
/// client-side when the board is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MemoryContent {
    /// The distinct card faces
    #[garde(
        length(min = 2, max = crate::constants::solo::MAX_ITEMS_COUNT),
        inner(length(chars, min = 1, max = crate::constants::solo::MAX_ITEM_LENGTH))
    )]
    pub cards: Vec<String>,
}

/// Static content of an independent sorting game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SortingContent {
    /// The items in their correct order
    #[garde(
        length(min = 2, max = crate::constants::solo::MAX_ITEMS_COUNT),
        inner(length(chars, min = 1, max = crate::constants::solo::MAX_ITEM_LENGTH))
    )]
    pub items: Vec<String>,
}

/// View-model for an independent game: the content, untouched
///
/// Each participant reads the content once and plays against a private
/// copy; no field here ever feeds back into a session patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SoloView {
    /// A matching game
    Matching(MatchingContent),
    /// A memory game
    Memory(MemoryContent),
    /// A sorting game
    Sorting(SortingContent),
}

/// Produces a random presentation order for `len` local items
///
/// Local-only: the result is never written to the session document, so
/// non-determinism is harmless here. Cooperative boards must use their
/// deterministic initial state instead.
pub fn local_shuffle(len: usize) -> Vec<usize> {
    let mut order = (0..len).collect_vec();
    fastrand::shuffle(&mut order);
    order
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_local_shuffle_is_a_permutation() {
        let order = local_shuffle(16);
        let sorted = order.iter().copied().sorted().collect_vec();
        assert_eq!(sorted, (0..16).collect_vec());
    }

    #[test]
    fn test_validation_rejects_single_sorting_item() {
        let content = SortingContent {
            items: vec!["only".to_owned()],
        };
        assert!(content.validate().is_err());
    }

    #[test]
    fn test_matching_content_round_trip() {
        let content = MatchingContent {
            pairs: vec![MatchPair {
                left: "cat".to_owned(),
                right: "chat".to_owned(),
            }],
        };
        let json = serde_json::to_string(&content).unwrap();
        let back: MatchingContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
