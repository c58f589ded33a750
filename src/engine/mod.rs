//! Packed 2048 board, row transition tables and board-level operations.
//!
//! - [`state`]: the `Board`/`Move` types and the tile codec.
//! - [`tables`]: the 65,536-entry per-row tables, built once.
//! - [`ops`]: shifting, transposing and game-over checks driven by the tables.

mod heuristic;
pub mod ops;
pub mod state;
pub mod tables;

pub use state::{
    decode_grid, encode_grid, encode_rows, encode_tile_value, try_encode_tile_value, Board, BoardError, Move,
    CELLS, MAX_EXPONENT,
};
pub use tables::Tables;

/// Initialize internal tables on first use. Safe to call multiple times.
pub fn new() {
    tables::init();
}
