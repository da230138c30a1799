//! Quality-ordered cell priority structure for the sequential smoother.
//!
//! [`QualityMap`] is an ordered multimap from a scalar quality key to cell
//! ids: the cell with the smallest key is the next smoothing target.
//! Several cells may share a key (all cells of a fresh uniform mesh have
//! quality 1), so each key holds its cells in insertion order, which makes
//! the extraction order stable.
//!
//! Keys are floats and are never compared for exact equality: removal looks
//! the key up within a `± EPSILON` range and then scans for the matching
//! cell. The caller additionally maintains a dense cell-to-key table so it
//! always knows the key a cell is stored under; together they satisfy the
//! invariant that every cell has exactly one map entry, at its stored key.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::quality::EPSILON;
use crate::mesh::CellId;

/// Total-ordered float key. Keys must be finite.
#[derive(Debug, Clone, Copy)]
struct MapKey(f64);

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for MapKey {}

impl PartialOrd for MapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Ordered multimap from quality key to cells, worst first.
#[derive(Debug, Clone, Default)]
pub struct QualityMap {
    entries: BTreeMap<MapKey, Vec<CellId>>,
    len: usize,
}

impl QualityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an entry. Cells sharing a key keep their insertion order.
    pub fn insert(&mut self, key: f64, cell: CellId) {
        self.entries.entry(MapKey(key)).or_default().push(cell);
        self.len += 1;
    }

    /// The entry with the smallest key; among equal keys, the one inserted
    /// first.
    pub fn min(&self) -> Option<(f64, CellId)> {
        self.entries
            .iter()
            .next()
            .map(|(key, cells)| (key.0, cells[0]))
    }

    /// Remove the entry for `cell` stored near `key`.
    ///
    /// Scans the keys within `key ± EPSILON` in ascending order and removes
    /// the first entry whose cell matches. Returns `false` if no such entry
    /// exists (the caller logs and skips in that case).
    pub fn remove(&mut self, key: f64, cell: CellId) -> bool {
        let range = MapKey(key - EPSILON)..=MapKey(key + EPSILON);
        let found = self
            .entries
            .range(range)
            .find(|(_, cells)| cells.contains(&cell))
            .map(|(k, _)| *k);

        let Some(k) = found else {
            return false;
        };
        if let Some(cells) = self.entries.get_mut(&k) {
            if let Some(pos) = cells.iter().position(|&c| c == cell) {
                cells.remove(pos);
                if cells.is_empty() {
                    self.entries.remove(&k);
                }
                self.len -= 1;
                return true;
            }
        }
        false
    }

    /// Iterate over all `(key, cell)` entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, CellId)> + '_ {
        self.entries
            .iter()
            .flat_map(|(key, cells)| cells.iter().map(move |&c| (key.0, c)))
    }
}
