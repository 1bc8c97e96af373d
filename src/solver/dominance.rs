//! Life-pair dominance table
//!
//! Two states with the same life-independent board fingerprint differ only
//! in life totals, which are monotone: if a position with life no worse
//! for the mover was still a loss, this one is a loss too, and a win from
//! no-better life is still a win. Only exact search values are stored —
//! alpha-beta bounds are not sound dominance evidence.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Debug, Default)]
pub struct DominanceTable {
    map: FxHashMap<u64, SmallVec<[(i32, i32, i8); 4]>>,
}

impl DominanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a known result decides this position outright.
    pub fn check(&self, board_key: u64, my_life: i32, opp_life: i32) -> Option<i8> {
        let entries = self.map.get(&board_key)?;
        for &(cached_my, cached_opp, value) in entries {
            // A loss from better-or-equal life dominates this state.
            if cached_my >= my_life && cached_opp <= opp_life && value == -1 {
                return Some(-1);
            }
            // A win from worse-or-equal life is dominated by this state.
            if cached_my <= my_life && cached_opp >= opp_life && value == 1 {
                return Some(1);
            }
        }
        None
    }

    /// Record an exact value for a position.
    pub fn store(&mut self, board_key: u64, my_life: i32, opp_life: i32, value: i8) {
        self.map
            .entry(board_key)
            .or_default()
            .push((my_life, opp_life, value));
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
