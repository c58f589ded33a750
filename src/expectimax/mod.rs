//! Expectimax search: the best player move and the most damaging tile spawn.
//!
//! [`Expectimax`] alternates maximizing player nodes with averaging system
//! nodes. Every query clears the searcher's transposition cache first, since
//! cached scores depend on the depth the query started at.
//!
//! Quick start
//! ```
//! use versus_2048::engine::Board;
//! use versus_2048::expectimax::{Expectimax, ExpectimaxConfig};
//!
//! // Keep doctests fast with a shallow cap.
//! let cfg = ExpectimaxConfig { depth_cap: Some(3), ..ExpectimaxConfig::default() };
//! let mut ex = Expectimax::with_config(cfg);
//! let b: Board = "1100 0000 0000 0000".parse().unwrap();
//! assert!(ex.best_move(b).is_some());
//! assert!(ex.worst_spawn_cell(b).is_some());
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::Move;

mod cache;
mod search;

pub use search::Expectimax;

/// Value of a player node with no legal move.
pub const LOSE_PENALTY: f64 = -200_000.0;

/// Starting score at the root; below [`LOSE_PENALTY`] so a losing but legal
/// move still beats "no move found".
pub const NO_MOVE_SCORE: f64 = -900_000.0;

/// Direction reported by the host API when no move is legal.
pub const DEFAULT_MOVE: Move = Move::Up;

/// Weight of a spawned 2.
pub const SPAWN_TWO_PROB: f64 = 0.9;
/// Weight of a spawned 4.
pub const SPAWN_FOUR_PROB: f64 = 0.1;

/// Shallowest root depth a query will run at.
pub const MIN_DEPTH: u8 = 2;

/// Search depth chosen from the number of empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthPolicy {
    /// Boards with at least this many empty cells search at `sparse`.
    pub sparse_min_empty: u8,
    pub sparse: u8,
    /// Otherwise, at least this many empty cells search at `mid`.
    pub mid_min_empty: u8,
    pub mid: u8,
    /// Everything fuller searches at `dense`.
    pub dense: u8,
}

impl DepthPolicy {
    /// Player-move policy: `>=8` empty → 6, `3..=7` → 7, fewer → 9.
    pub const PLAYER: DepthPolicy = DepthPolicy { sparse_min_empty: 8, sparse: 6, mid_min_empty: 3, mid: 7, dense: 9 };

    /// Spawn policy: `>=5` empty → 6, fewer → 7.
    pub const SPAWN: DepthPolicy = DepthPolicy { sparse_min_empty: 5, sparse: 6, mid_min_empty: 0, mid: 7, dense: 7 };

    #[inline]
    pub fn depth_for(&self, empty: u32) -> u8 {
        if empty >= self.sparse_min_empty as u32 {
            self.sparse
        } else if empty >= self.mid_min_empty as u32 {
            self.mid
        } else {
            self.dense
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        for depth in [self.sparse, self.mid, self.dense] {
            if depth < MIN_DEPTH {
                return Err(ConfigError::Invalid(format!("{name} depth {depth} is below {MIN_DEPTH}")));
            }
        }
        Ok(())
    }
}

/// Configurable knobs for Expectimax. Defaults reproduce the reference engine.
///
/// - `player_depth` / `spawn_depth`: depth policies for the two queries.
/// - `depth_cap`: optional hard cap for depth (never below [`MIN_DEPTH`]).
/// - `four_spawn_horizon`: plies from the root within which system nodes also
///   consider a spawned 4.
/// - `cache_enabled`: enable/disable transposition table usage.
/// - `cache_limit`: entries after which the cache starts over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    pub player_depth: DepthPolicy,
    pub spawn_depth: DepthPolicy,
    pub depth_cap: Option<u8>,
    pub four_spawn_horizon: u8,
    pub cache_enabled: bool,
    pub cache_limit: usize,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            player_depth: DepthPolicy::PLAYER,
            spawn_depth: DepthPolicy::SPAWN,
            depth_cap: None,
            four_spawn_horizon: 4,
            cache_enabled: true,
            cache_limit: 1 << 22,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ExpectimaxConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.player_depth.validate("player")?;
        self.spawn_depth.validate("spawn")?;
        if let Some(cap) = self.depth_cap {
            if cap < MIN_DEPTH {
                return Err(ConfigError::Invalid(format!("depth cap {cap} is below {MIN_DEPTH}")));
            }
        }
        if self.cache_limit == 0 {
            return Err(ConfigError::Invalid("cache limit must be positive".into()));
        }
        Ok(())
    }

    #[inline]
    fn capped(&self, depth: u8) -> u8 {
        self.depth_cap.map_or(depth, |cap| depth.min(cap)).max(MIN_DEPTH)
    }
}

/// Per-branch expected value at the root of a player query.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Expected value of spawning into `cell` (row-major, 0 = top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnEval {
    pub cell: usize,
    pub ev: f64,
}

/// Basic search stats for the last query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub cache_hits: u64,
    pub cache_entries: usize,
    pub cache_resets: u64,
    pub peak_nodes: u64,
}
