//! Transposition table
//!
//! Keyed on the canonical state fingerprint. Entries carry the alpha-beta
//! bound type so a cached lower/upper bound can still cut when the exact
//! value is unknown. Replacement is depth-preferred: an entry computed
//! closer to the root covers a larger subtree and wins ties. The table is
//! capacity-bounded; running full just stops new inserts, which is safe.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Exact,
    /// Value is a lower bound (search failed high)
    Lower,
    /// Value is an upper bound (search failed low)
    Upper,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TTEntry {
    pub value: i8,
    pub bound: Bound,
    /// Ply depth at which the entry was computed
    pub depth: u32,
}

#[derive(Debug)]
pub struct TranspositionTable {
    map: FxHashMap<u64, TTEntry>,
    capacity: usize,
}

impl TranspositionTable {
    pub fn new(capacity: usize) -> Self {
        TranspositionTable {
            map: FxHashMap::default(),
            capacity,
        }
    }

    #[inline]
    pub fn get(&self, key: u64) -> Option<TTEntry> {
        self.map.get(&key).copied()
    }

    #[inline]
    pub fn put(&mut self, key: u64, entry: TTEntry) {
        match self.map.get(&key) {
            Some(old) => {
                if entry.depth <= old.depth {
                    self.map.insert(key, entry);
                }
            }
            None => {
                if self.map.len() < self.capacity {
                    self.map.insert(key, entry);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &TTEntry)> {
        self.map.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut tt = TranspositionTable::new(16);
        tt.put(
            1,
            TTEntry {
                value: 1,
                bound: Bound::Exact,
                depth: 5,
            },
        );
        let entry = tt.get(1).unwrap();
        assert_eq!(entry.value, 1);
        assert_eq!(entry.bound, Bound::Exact);
        assert!(tt.get(2).is_none());
    }

    #[test]
    fn test_depth_preferred_replacement() {
        let mut tt = TranspositionTable::new(16);
        tt.put(
            1,
            TTEntry {
                value: 0,
                bound: Bound::Exact,
                depth: 5,
            },
        );
        // Deeper entry does not evict a shallower one.
        tt.put(
            1,
            TTEntry {
                value: 1,
                bound: Bound::Exact,
                depth: 9,
            },
        );
        assert_eq!(tt.get(1).unwrap().value, 0);
        // Shallower entry replaces.
        tt.put(
            1,
            TTEntry {
                value: -1,
                bound: Bound::Lower,
                depth: 2,
            },
        );
        assert_eq!(tt.get(1).unwrap().value, -1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut tt = TranspositionTable::new(2);
        for key in 0..5u64 {
            tt.put(
                key,
                TTEntry {
                    value: 0,
                    bound: Bound::Exact,
                    depth: 1,
                },
            );
        }
        assert_eq!(tt.len(), 2);
        // Existing keys still update.
        tt.put(
            0,
            TTEntry {
                value: 1,
                bound: Bound::Exact,
                depth: 0,
            },
        );
        assert_eq!(tt.get(0).unwrap().value, 1);
    }
}
