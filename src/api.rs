//! Host-facing entry points taking a board as four packed row words.
//!
//! The host converts tile values with [`encode_tile_value`](crate::engine::encode_tile_value)
//! and packs each row with the first cell in the high nibble. Each thread keeps
//! one searcher; its cache is cleared at the start of every call.

use std::cell::RefCell;

use crate::engine::Board;
use crate::expectimax::{Expectimax, DEFAULT_MOVE};

thread_local! {
    static SEARCHER: RefCell<Expectimax<'static>> = RefCell::new(Expectimax::new());
}

/// Best player move as a direction code (0=up, 1=right, 2=down, 3=left).
///
/// A board with no legal move yields the default direction, up.
///
/// ```
/// use versus_2048::api::next_player_move;
/// // Nothing can slide on an empty board.
/// assert_eq!(next_player_move([0, 0, 0, 0]), 0);
/// ```
pub fn next_player_move(rows: [u16; 4]) -> u8 {
    let board = Board::from_rows(rows);
    let best = SEARCHER.with(|s| s.borrow_mut().best_move(board));
    match best {
        Some(dir) => dir.code(),
        None => {
            log::warn!("no legal move for {board:?}, answering {DEFAULT_MOVE}");
            DEFAULT_MOVE.code()
        }
    }
}

/// Cell index (0..15, row-major, 0 = top-left) where the next tile does the
/// most damage. A full board yields cell 0.
pub fn next_system_tile(rows: [u16; 4]) -> u8 {
    let board = Board::from_rows(rows);
    let worst = SEARCHER.with(|s| s.borrow_mut().worst_spawn_cell(board));
    match worst {
        Some(cell) => cell as u8,
        None => {
            log::warn!("no empty cell on {board:?}, answering cell 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_board_answers_cell_zero() {
        assert_eq!(next_system_tile([0x1212, 0x2121, 0x1212, 0x2121]), 0);
    }

    #[test]
    fn single_free_cell_is_chosen() {
        // Only the top-left cell is free.
        assert_eq!(next_system_tile([0x0212, 0x2121, 0x1212, 0x2121]), 0);
        // Only the bottom-right cell is free.
        assert_eq!(next_system_tile([0x1212, 0x2121, 0x1212, 0x2120]), 15);
    }

    #[test]
    fn dead_board_answers_up() {
        assert_eq!(next_player_move([0x1212, 0x2121, 0x1212, 0x2121]), 0);
    }
}
