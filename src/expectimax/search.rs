use crate::engine::{ops, tables, Board, Move, Tables, CELLS};

use super::cache::TranspositionCache;
use super::{
    BranchEval, ExpectimaxConfig, SearchStats, SpawnEval, LOSE_PENALTY, NO_MOVE_SCORE, SPAWN_FOUR_PROB,
    SPAWN_TWO_PROB,
};

/// Single-threaded Expectimax search over a shared set of [`Tables`].
///
/// The searcher owns its transposition cache, so one searcher serves one
/// query at a time; run concurrent queries on separate searchers.
pub struct Expectimax<'t> {
    tables: &'t Tables,
    cfg: ExpectimaxConfig,
    cache: TranspositionCache,
    stats: SearchStats,
}

impl Expectimax<'static> {
    /// Searcher with default config over the process-wide tables.
    pub fn new() -> Self {
        Self::with_config(ExpectimaxConfig::default())
    }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self::with_tables(tables::global(), cfg)
    }
}

impl<'t> Expectimax<'t> {
    /// Searcher over explicitly built tables.
    pub fn with_tables(tables: &'t Tables, cfg: ExpectimaxConfig) -> Self {
        let cache = TranspositionCache::new(cfg.cache_enabled, cfg.cache_limit);
        Self { tables, cfg, cache, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig {
        &self.cfg
    }

    /// Root depth a player query on `board` runs at.
    #[inline]
    pub fn player_depth(&self, board: Board) -> u8 {
        self.cfg.capped(self.cfg.player_depth.depth_for(self.tables.count_empty(board)))
    }

    /// Root depth a spawn query on `board` runs at.
    #[inline]
    pub fn spawn_depth(&self, board: Board) -> u8 {
        self.cfg.capped(self.cfg.spawn_depth.depth_for(self.tables.count_empty(board)))
    }

    /// Compute the best move using expectimax, or `None` if no move is legal.
    ///
    /// Example
    /// ```
    /// use versus_2048::engine::Board;
    /// use versus_2048::expectimax::{Expectimax, ExpectimaxConfig};
    /// let cfg = ExpectimaxConfig { depth_cap: Some(2), ..ExpectimaxConfig::default() };
    /// let mut ex = Expectimax::with_config(cfg);
    /// assert!(ex.best_move(Board::from_raw(0x1100_0000_0000_0000)).is_some());
    /// assert_eq!(ex.best_move(Board::EMPTY), None);
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let mut best_score = NO_MOVE_SCORE;
        let mut best_move = None;
        for branch in self.branch_evals(board) {
            if branch.legal && branch.ev > best_score {
                best_score = branch.ev;
                best_move = Some(branch.dir);
            }
        }
        best_move
    }

    /// Compute EV for each direction (no normalization).
    ///
    /// Returns a fixed array in [`Move::ALL`] order and marks illegal moves
    /// as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth = self.player_depth(board);
        self.begin_query(depth);
        let moved = ops::shift_all(self.tables, board);
        let mut out = Move::ALL.map(|dir| BranchEval { dir, ev: NO_MOVE_SCORE, legal: false });
        for (branch, next) in out.iter_mut().zip(moved) {
            if next != board {
                branch.ev = self.eval_system(next, depth - 1, depth);
                branch.legal = true;
            }
        }
        self.finish_query("best_move", board);
        out
    }

    /// Cell (row-major, 0 = top-left) where a spawn hurts the player most,
    /// or `None` on a full board.
    ///
    /// ```
    /// use versus_2048::engine::Board;
    /// use versus_2048::expectimax::{Expectimax, ExpectimaxConfig};
    /// let cfg = ExpectimaxConfig { depth_cap: Some(2), ..ExpectimaxConfig::default() };
    /// let mut ex = Expectimax::with_config(cfg);
    /// // Only cell 15 is free.
    /// let b = Board::from_raw(0x1212_2121_1212_2120);
    /// assert_eq!(ex.worst_spawn_cell(b), Some(15));
    /// ```
    pub fn worst_spawn_cell(&mut self, board: Board) -> Option<usize> {
        let mut worst_score = f64::INFINITY;
        let mut worst_cell = None;
        for spawn in self.spawn_evals(board) {
            if spawn.ev < worst_score {
                worst_score = spawn.ev;
                worst_cell = Some(spawn.cell);
            }
        }
        worst_cell
    }

    /// EV of each possible spawn cell, scanned from the bottom-right cell.
    ///
    /// Every cell weighs a 2 and a 4 regardless of depth, since this is the
    /// query's own root decision.
    pub fn spawn_evals(&mut self, board: Board) -> Vec<SpawnEval> {
        let depth = self.spawn_depth(board);
        self.begin_query(depth);
        let mut out = Vec::with_capacity(self.tables.count_empty(board) as usize);
        let mut tmp = board.raw();
        let mut insert_tile: u64 = 1;
        for pos in 0..CELLS {
            if (tmp & 0xf) == 0 {
                let two = Board::from_raw(board.raw() | insert_tile);
                let four = Board::from_raw(board.raw() | (insert_tile << 1));
                let ev = self.eval_player(two, depth - 1, depth) * SPAWN_TWO_PROB
                    + self.eval_player(four, depth - 1, depth) * SPAWN_FOUR_PROB;
                out.push(SpawnEval { cell: CELLS - 1 - pos, ev });
            }
            tmp >>= 4;
            insert_tile <<= 4;
        }
        self.finish_query("worst_spawn_cell", board);
        out
    }

    /// Statistics collected from the last query.
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }

    fn begin_query(&mut self, depth: u8) {
        self.cache.clear();
        self.stats.depth = depth;
        self.stats.nodes = 0;
    }

    fn finish_query(&mut self, query: &str, board: Board) {
        self.stats.cache_hits = self.cache.hits();
        self.stats.cache_entries = self.cache.len();
        self.stats.cache_resets = self.cache.resets();
        self.stats.peak_nodes = self.stats.peak_nodes.max(self.stats.nodes);
        log::debug!(
            "{query} {board:?}: depth={} nodes={} cache_entries={} cache_hits={} cache_resets={}",
            self.stats.depth,
            self.stats.nodes,
            self.stats.cache_entries,
            self.stats.cache_hits,
            self.stats.cache_resets,
        );
    }

    /// Max node: best value over legal slides.
    fn eval_player(&mut self, board: Board, depth: u8, root_depth: u8) -> f64 {
        if let Some(score) = self.cache.get(board, depth) {
            return score;
        }
        self.stats.nodes += 1;

        let mut best = LOSE_PENALTY;
        for moved in ops::shift_all(self.tables, board) {
            if moved == board {
                continue;
            }
            let score = if depth == 1 {
                self.tables.heuristic_score(moved)
            } else {
                self.eval_system(moved, depth - 1, root_depth)
            };
            if score > best {
                best = score;
            }
        }

        self.cache.insert(board, depth, best);
        best
    }

    /// Chance node: mean value over every empty cell receiving a tile.
    ///
    /// Within `four_spawn_horizon` plies of the root a cell weighs a 2 and a
    /// 4; deeper down only the 2 is tried.
    fn eval_system(&mut self, board: Board, depth: u8, root_depth: u8) -> f64 {
        if let Some(score) = self.cache.get(board, depth) {
            return score;
        }
        self.stats.nodes += 1;

        let ply = root_depth.saturating_sub(depth);
        let with_fours = ply <= self.cfg.four_spawn_horizon;
        let mut score = 0.0;
        let mut count = 0u32;
        let mut tmp = board.raw();
        let mut insert_tile: u64 = 1;
        for _ in 0..CELLS {
            if (tmp & 0xf) == 0 {
                count += 1;
                let two = Board::from_raw(board.raw() | insert_tile);
                if with_fours {
                    let four = Board::from_raw(board.raw() | (insert_tile << 1));
                    score += self.eval_spawned(two, depth, root_depth) * SPAWN_TWO_PROB;
                    score += self.eval_spawned(four, depth, root_depth) * SPAWN_FOUR_PROB;
                } else {
                    score += self.eval_spawned(two, depth, root_depth);
                }
            }
            tmp >>= 4;
            insert_tile <<= 4;
        }

        let score = if count > 0 {
            score / count as f64
        } else if depth == 1 {
            self.tables.heuristic_score(board)
        } else {
            self.eval_player(board, depth - 1, root_depth)
        };

        self.cache.insert(board, depth, score);
        score
    }

    #[inline]
    fn eval_spawned(&mut self, board: Board, depth: u8, root_depth: u8) -> f64 {
        if depth == 1 {
            self.tables.heuristic_score(board)
        } else {
            self.eval_player(board, depth - 1, root_depth)
        }
    }
}

impl Default for Expectimax<'static> {
    fn default() -> Self {
        Self::new()
    }
}
