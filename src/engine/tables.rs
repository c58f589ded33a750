use std::sync::OnceLock;

use super::heuristic;
use super::ops;
use super::state::{Board, Line};

/// Precomputed lookup tables for all possible 4-tile lines (16-bit packed).
///
/// Shifting, merging and scoring a row depends only on its 4 nibbles, so
/// every runtime board operation is a handful of lookups into these tables.
///
/// Layout:
/// - `move_left/right[i]`: replacement 16-bit row after the move.
/// - `move_up/down[i]`: the same collapse spread one nibble per 16-bit lane,
///   ready to be OR-ed into a board at a column offset.
/// - `transpose[i]`: the row spread into lanes without merging.
/// - `zero_count[i]`: number of empty cells.
/// - `score[i]`: heuristic value of the row.
///
/// Built once and never mutated; share it freely between threads.
pub struct Tables {
    move_left: Box<[Line]>,
    move_right: Box<[Line]>,
    move_up: Box<[u64]>,
    move_down: Box<[u64]>,
    transpose: Box<[u64]>,
    zero_count: Box<[u8]>,
    score: Box<[f64]>,
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Process-wide tables, built on first use.
#[inline]
pub fn global() -> &'static Tables {
    TABLES.get_or_init(Tables::build)
}

/// Ensure the process-wide tables are initialized. Safe to call multiple times.
pub fn init() {
    let _ = global();
}

impl Tables {
    /// Enumerate every row and fill all tables.
    pub fn build() -> Self {
        // Allocate on the heap to keep stack frames small during init.
        let mut move_left = vec![0; LINE_TABLE_SIZE];
        let mut move_right = vec![0; LINE_TABLE_SIZE];
        let mut move_up = vec![0u64; LINE_TABLE_SIZE];
        let mut move_down = vec![0u64; LINE_TABLE_SIZE];
        let mut transpose = vec![0u64; LINE_TABLE_SIZE];
        let mut zero_count = vec![0u8; LINE_TABLE_SIZE];
        let mut score = vec![0f64; LINE_TABLE_SIZE];

        for val in 0..LINE_TABLE_SIZE {
            let tiles = ops::line_to_tiles(val as Line);
            let left = ops::slide_towards_first(tiles);
            let right = ops::slide_towards_last(tiles);

            move_left[val] = ops::tiles_to_line(left);
            move_right[val] = ops::tiles_to_line(right);
            move_up[val] = ops::tiles_to_spread(left);
            move_down[val] = ops::tiles_to_spread(right);
            transpose[val] = ops::tiles_to_spread(tiles);
            zero_count[val] = tiles.iter().filter(|&&t| t == 0).count() as u8;
            score[val] = heuristic::line_score(tiles);
        }

        log::debug!("built {} row transition tables", LINE_TABLE_SIZE);

        Tables {
            move_left: move_left.into_boxed_slice(),
            move_right: move_right.into_boxed_slice(),
            move_up: move_up.into_boxed_slice(),
            move_down: move_down.into_boxed_slice(),
            transpose: transpose.into_boxed_slice(),
            zero_count: zero_count.into_boxed_slice(),
            score: score.into_boxed_slice(),
        }
    }

    // Callers mask rows to 16 bits, so indexing never goes out of range.

    #[inline(always)]
    pub fn move_left(&self, row: u64) -> Line {
        self.move_left[row as usize]
    }

    #[inline(always)]
    pub fn move_right(&self, row: u64) -> Line {
        self.move_right[row as usize]
    }

    #[inline(always)]
    pub fn move_up(&self, row: u64) -> u64 {
        self.move_up[row as usize]
    }

    #[inline(always)]
    pub fn move_down(&self, row: u64) -> u64 {
        self.move_down[row as usize]
    }

    #[inline(always)]
    pub fn transpose(&self, row: u64) -> u64 {
        self.transpose[row as usize]
    }

    #[inline(always)]
    pub fn zero_count(&self, row: u64) -> u8 {
        self.zero_count[row as usize]
    }

    #[inline(always)]
    pub fn row_score(&self, row: u64) -> f64 {
        self.score[row as usize]
    }

    /// Count the number of empty cells on a board.
    #[inline]
    pub fn count_empty(&self, board: Board) -> u32 {
        let b = board.raw();
        (0..4).fold(0, |acc, k| acc + self.zero_count(b >> (16 * k) & 0xffff) as u32)
    }

    /// Heuristic value of a board: its four rows plus its four columns.
    ///
    /// ```
    /// use versus_2048::engine::{tables, Board};
    /// let t = tables::global();
    /// let b = Board::from_raw(0x1000_0000_0000_0000);
    /// assert_eq!(t.heuristic_score(b), b.heuristic_score());
    /// ```
    #[inline]
    pub fn heuristic_score(&self, board: Board) -> f64 {
        let b = board.raw();
        let t = ops::transpose(self, board).raw();
        (0..4).fold(0., |score, k| {
            score + self.row_score(b >> (16 * k) & 0xffff) + self.row_score(t >> (16 * k) & 0xffff)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_build_matches_global() {
        let built = Tables::build();
        let shared = global();
        for row in [0u64, 0x1111, 0x1332, 0xf0f0, 0xffff] {
            assert_eq!(built.move_left(row), shared.move_left(row));
            assert_eq!(built.move_down(row), shared.move_down(row));
            assert_eq!(built.row_score(row), shared.row_score(row));
        }
    }

    #[test]
    fn it_counts_zeros() {
        let t = global();
        assert_eq!(t.zero_count(0x0000), 4);
        assert_eq!(t.zero_count(0x1020), 2);
        assert_eq!(t.count_empty(Board::from_raw(0x1111000011110000)), 8);
        assert_eq!(t.count_empty(Board::from_raw(0x1100000000000000)), 14);
        assert_eq!(t.count_empty(Board::EMPTY), 16);
    }

    #[test]
    fn empty_board_scores_eight_empty_lines() {
        let t = global();
        assert!((t.heuristic_score(Board::EMPTY) - 8.0 * t.row_score(0)).abs() < 1e-9);
    }

    #[test]
    fn board_score_includes_columns() {
        let t = global();
        // One tile in the top-left corner: row 0 and column 0 are 0x1000.
        let b = Board::from_raw(0x1000_0000_0000_0000);
        let expected = 2.0 * t.row_score(0x1000) + 6.0 * t.row_score(0);
        assert!((t.heuristic_score(b) - expected).abs() < 1e-9);
    }
}
