//! Shuffle projections
//!
//! A projection is a random permutation of a source's base sequence. The
//! item that is playing when shuffle is turned on is pinned to the front so
//! playback continues without a jump.

use crate::types::Item;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Build a shuffled copy of `items`
///
/// When `pinned` names a valid index, that item is moved to position 0 and
/// only the remaining items are shuffled (Fisher-Yates). Out-of-range pins
/// are ignored.
pub fn pinned_shuffle<R: Rng + ?Sized>(
    items: &[Arc<Item>],
    pinned: Option<usize>,
    rng: &mut R,
) -> Vec<Arc<Item>> {
    let mut projection: Vec<Arc<Item>> = items.to_vec();

    match pinned {
        Some(index) if index < projection.len() => {
            let head = projection.remove(index);
            projection.shuffle(rng);
            projection.insert(0, head);
        }
        _ => projection.shuffle(rng),
    }

    projection
}

/// Position of `item` in `items`, by shared-allocation identity
pub fn position_of(items: &[Arc<Item>], item: &Arc<Item>) -> Option<usize> {
    items.iter().position(|candidate| Arc::ptr_eq(candidate, item))
}
