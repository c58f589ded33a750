//! versus-2048: expectimax player and adversarial tile spawner for 2048
//!
//! This crate provides:
//! - A compact `Board` type (16 nibbles in a `u64`) with the tile codec
//! - Per-row transition and heuristic tables built once (`engine::tables`)
//! - An Expectimax searcher (`expectimax` module) answering two queries:
//!   the best player move and the worst cell for the next spawn
//! - Host entry points taking four packed row words (`api` module)
//! - A headless game driver pitting the two against each other (`game` module)
//!
//! Quick start:
//! ```
//! use versus_2048::engine::{self as GameEngine, Board, Move};
//!
//! // One-time table init (optional; tables also build on first use)
//! GameEngine::new();
//!
//! let b: Board = "1111 0000 0000 0000".parse().unwrap();
//! assert_eq!(b.shift(Move::Left).rows(), [0x2200, 0, 0, 0]);
//! ```
//!
//! Queries
//! ```
//! use versus_2048::api::{next_player_move, next_system_tile};
//!
//! // Rows hold log2 tile values, first cell in the high nibble.
//! // Only the bottom-right cell is free.
//! assert_eq!(next_system_tile([0x1212, 0x2121, 0x1212, 0x2120]), 15);
//! // A dead board answers the default direction (0 = up).
//! assert_eq!(next_player_move([0x1212, 0x2121, 0x1212, 0x2121]), 0);
//! ```
//!
pub mod api;
pub mod engine;
pub mod expectimax;
pub mod game;
