//! Headless game driver: the expectimax player against random or adversarial spawns.

use std::time::Instant;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::engine::{ops, Board, Move};
use crate::expectimax::{Expectimax, ExpectimaxConfig};

/// Exponent of the 2048 tile.
const WIN_EXPONENT: u8 = 11;

/// Tiles placed before the first move.
const START_TILES: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct GameOptions {
    /// Let the worst-spawn search pick where new tiles go.
    pub adversary: bool,
    /// Stop after this many moves even if the game is not over.
    pub max_moves: Option<u32>,
    pub config: ExpectimaxConfig,
}

/// One player move and the spawn that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub dir: Move,
    /// Points gained from merges.
    pub gain: u64,
    /// Cell the new tile went into (row-major).
    pub spawn_cell: usize,
    /// Whether the spawn cell came from the adversary.
    pub adversarial: bool,
    pub board: Board,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub seed: u64,
    pub adversary: bool,
    pub moves: u32,
    pub score: u64,
    pub highest_tile: u32,
    pub won: bool,
    pub over: bool,
    pub final_board: String,
    pub nodes: u64,
    pub elapsed_s: f64,
}

pub struct Game {
    board: Board,
    score: u64,
    moves: u32,
    won: bool,
    over: bool,
    nodes: u64,
    seed: u64,
    options: GameOptions,
    player: Expectimax<'static>,
    adversary: Option<Expectimax<'static>>,
    rng: StdRng,
}

impl Game {
    /// New game with two random start tiles drawn from a seeded RNG.
    ///
    /// ```
    /// use versus_2048::game::{Game, GameOptions};
    /// let game = Game::new(GameOptions::default(), 42);
    /// assert_eq!(game.board().count_empty(), 14);
    /// ```
    pub fn new(options: GameOptions, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let board = (0..START_TILES).fold(Board::EMPTY, |b, _| b.with_random_tile(&mut rng));
        let player = Expectimax::with_config(options.config.clone());
        let adversary = options.adversary.then(|| Expectimax::with_config(options.config.clone()));
        Self {
            board,
            score: 0,
            moves: 0,
            won: false,
            over: board.is_game_over(),
            nodes: 0,
            seed,
            options,
            player,
            adversary,
            rng,
        }
    }

    #[inline]
    pub fn board(&self) -> Board {
        self.board
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[inline]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.over
    }

    #[inline]
    pub fn has_won(&self) -> bool {
        self.won
    }

    fn reached_move_limit(&self) -> bool {
        self.options.max_moves.is_some_and(|limit| self.moves >= limit)
    }

    /// Play one move and spawn one tile. Returns `None` once the game is over
    /// or the move limit is reached.
    pub fn step(&mut self) -> Option<Turn> {
        if self.over || self.reached_move_limit() {
            return None;
        }
        let dir = match self.player.best_move(self.board) {
            Some(dir) => dir,
            None => {
                self.over = true;
                return None;
            }
        };
        self.nodes += self.player.last_stats().nodes;

        let moved = self.board.shift(dir);
        let gain = moved.score().saturating_sub(self.board.score());
        self.score += gain;
        if moved.highest_exponent() >= WIN_EXPONENT && !self.won {
            log::info!("reached 2048 after {} moves", self.moves + 1);
            self.won = true;
        }

        let (spawn_cell, adversarial) = self.spawn(moved);
        let exponent = ops::generate_random_tile(&mut self.rng);
        self.board = moved.with_tile(spawn_cell, exponent);
        self.moves += 1;
        self.over = self.board.is_game_over();

        Some(Turn { dir, gain, spawn_cell, adversarial, board: self.board })
    }

    // The adversary only picks when there is a real choice to make.
    fn spawn(&mut self, moved: Board) -> (usize, bool) {
        if let Some(adversary) = self.adversary.as_mut() {
            if moved.count_empty() > 1 {
                if let Some(cell) = adversary.worst_spawn_cell(moved) {
                    self.nodes += adversary.last_stats().nodes;
                    return (cell, true);
                }
            }
        }
        let free: Vec<usize> = moved.empty_cells().collect();
        (free[self.rng.gen_range(0..free.len())], false)
    }

    /// Play until the game ends, calling `on_turn` after every move.
    pub fn run<F: FnMut(&Turn)>(&mut self, mut on_turn: F) -> GameSummary {
        let start = Instant::now();
        while let Some(turn) = self.step() {
            on_turn(&turn);
        }
        let mut summary = self.summary();
        summary.elapsed_s = start.elapsed().as_secs_f64();
        summary
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            seed: self.seed,
            adversary: self.options.adversary,
            moves: self.moves,
            score: self.score,
            highest_tile: self.board.highest_tile(),
            won: self.won,
            over: self.over,
            final_board: format!("{:016x}", self.board.raw()),
            nodes: self.nodes,
            elapsed_s: 0.0,
        }
    }
}
