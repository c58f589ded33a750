use std::collections::HashMap;

use ahash::RandomState;

use crate::engine::Board;

/// Transposition cache for a single query: `(board, remaining depth) -> score`.
///
/// Scores are only comparable under one root depth, so the owner clears the
/// cache before every query. Clearing keeps the allocation for the next query.
///
/// Player and system nodes share the key space: within one query they always
/// sit at remaining depths of opposite parity.
pub(crate) struct TranspositionCache {
    map: HashMap<(Board, u8), f64, RandomState>,
    enabled: bool,
    limit: usize,
    hits: u64,
    resets: u64,
}

impl TranspositionCache {
    pub(crate) fn new(enabled: bool, limit: usize) -> Self {
        Self { map: HashMap::with_hasher(RandomState::new()), enabled, limit: limit.max(1), hits: 0, resets: 0 }
    }

    /// Drop every entry and zero the counters.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.resets = 0;
    }

    #[inline]
    pub(crate) fn get(&mut self, board: Board, depth: u8) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        let hit = self.map.get(&(board, depth)).copied();
        if hit.is_some() {
            self.hits += 1;
        }
        hit
    }

    /// Insert a score, starting over with an empty map once the limit is hit.
    #[inline]
    pub(crate) fn insert(&mut self, board: Board, depth: u8, score: f64) {
        if !self.enabled {
            return;
        }
        if self.map.len() >= self.limit {
            log::trace!("transposition cache reached {} entries, starting over", self.map.len());
            self.map.clear();
            self.resets += 1;
        }
        self.map.insert((board, depth), score);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub(crate) fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub(crate) fn resets(&self) -> u64 {
        self.resets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_include_depth() {
        let mut cache = TranspositionCache::new(true, 16);
        let b = Board::from_raw(0x1234);
        cache.insert(b, 3, 1.5);
        assert_eq!(cache.get(b, 3), Some(1.5));
        assert_eq!(cache.get(b, 2), None);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn clear_empties_entries_and_counters() {
        let mut cache = TranspositionCache::new(true, 16);
        cache.insert(Board::EMPTY, 1, 0.0);
        let _ = cache.get(Board::EMPTY, 1);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.get(Board::EMPTY, 1), None);
    }

    #[test]
    fn starts_over_at_limit() {
        let mut cache = TranspositionCache::new(true, 2);
        cache.insert(Board::from_raw(1), 1, 1.0);
        cache.insert(Board::from_raw(2), 1, 2.0);
        cache.insert(Board::from_raw(3), 1, 3.0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resets(), 1);
        assert_eq!(cache.get(Board::from_raw(1), 1), None);
        assert_eq!(cache.get(Board::from_raw(3), 1), Some(3.0));
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let mut cache = TranspositionCache::new(false, 16);
        cache.insert(Board::EMPTY, 1, 0.0);
        assert_eq!(cache.get(Board::EMPTY, 1), None);
        assert_eq!(cache.len(), 0);
    }
}
