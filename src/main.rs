use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use versus_2048::engine::{self as GameEngine, Board};
use versus_2048::expectimax::{Expectimax, ExpectimaxConfig};
use versus_2048::game::{Game, GameOptions, GameSummary};

#[derive(Parser, Debug)]
#[command(
    name = "versus-2048",
    version,
    about = "Expectimax 2048 player and adversarial tile spawner"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play one game, printing the board after every move
    Play {
        /// RNG seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Let the worst-spawn search place new tiles
        #[arg(long)]
        adversary: bool,
        /// Stop after this many moves
        #[arg(long, value_name = "N")]
        max_moves: Option<u32>,
        /// Only print the final summary
        #[arg(short, long)]
        quiet: bool,
        /// JSON search config
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Play independent games in parallel and print one JSON summary per game
    Batch {
        /// Number of games
        #[arg(short = 'n', long, default_value_t = 8)]
        games: u64,
        /// Seed of the first game; game i uses seed + i
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Let the worst-spawn search place new tiles
        #[arg(long)]
        adversary: bool,
        /// Stop each game after this many moves
        #[arg(long, value_name = "N")]
        max_moves: Option<u32>,
        /// Worker threads (rayon default if omitted)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
        /// JSON search config
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the best player move for a board given as hex rows
    Best {
        /// Four row words (e.g. `1234 0000 0001 0021`) or one packed word
        #[arg(required = true, num_args = 1..=4)]
        rows: Vec<String>,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the most damaging spawn cell for a board given as hex rows
    Worst {
        #[arg(required = true, num_args = 1..=4)]
        rows: Vec<String>,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    GameEngine::new();

    match cli.cmd {
        Command::Play { seed, adversary, max_moves, quiet, config } => {
            let options = GameOptions { adversary, max_moves, config: load_config(config.as_deref())? };
            let seed = seed.unwrap_or_else(rand::random);
            let mut game = Game::new(options, seed);
            if !quiet {
                println!("{}", game.board());
            }
            let summary = game.run(|turn| {
                if !quiet {
                    let by = if turn.adversarial { "adversary" } else { "random" };
                    println!("{} (+{}), tile at {} by {}", turn.dir, turn.gain, turn.spawn_cell, by);
                    println!("{}", turn.board);
                }
            });
            println!("{}", serde_json::to_string(&summary)?);
        }
        Command::Batch { games, seed, adversary, max_moves, threads, config } => {
            let options = GameOptions { adversary, max_moves, config: load_config(config.as_deref())? };
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(n) = threads {
                builder = builder.num_threads(n);
            }
            let pool = builder.build().context("building worker pool")?;

            let pb = ProgressBar::new(games);
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                    .progress_chars("=>-"),
            );
            let summaries: Vec<GameSummary> = pool.install(|| {
                (0..games)
                    .into_par_iter()
                    .map(|i| {
                        let summary = Game::new(options.clone(), seed.wrapping_add(i)).run(|_| {});
                        pb.inc(1);
                        summary
                    })
                    .collect()
            });
            pb.finish_and_clear();

            for summary in &summaries {
                println!("{}", serde_json::to_string(summary)?);
            }
            report_batch(&summaries);
        }
        Command::Best { rows, config } => {
            let board = parse_board(&rows)?;
            let mut ex = Expectimax::with_config(load_config(config.as_deref())?);
            match ex.best_move(board) {
                Some(dir) => println!("{} ({})", dir.code(), dir),
                None => println!("no legal move"),
            }
            log::info!("search stats: {:?}", ex.last_stats());
        }
        Command::Worst { rows, config } => {
            let board = parse_board(&rows)?;
            let mut ex = Expectimax::with_config(load_config(config.as_deref())?);
            match ex.worst_spawn_cell(board) {
                Some(cell) => println!("{}", cell),
                None => println!("board is full"),
            }
            log::info!("search stats: {:?}", ex.last_stats());
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExpectimaxConfig> {
    match path {
        Some(p) => ExpectimaxConfig::from_json_file(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(ExpectimaxConfig::default()),
    }
}

fn parse_board(rows: &[String]) -> anyhow::Result<Board> {
    let board: Board = rows.join(" ").parse()?;
    log::debug!("parsed board:\n{}", board);
    Ok(board)
}

fn report_batch(summaries: &[GameSummary]) {
    if summaries.is_empty() {
        return;
    }
    let n = summaries.len() as f64;
    let mean_score = summaries.iter().map(|s| s.score as f64).sum::<f64>() / n;
    let wins = summaries.iter().filter(|s| s.won).count();
    let best_tile = summaries.iter().map(|s| s.highest_tile).max().unwrap_or(0);
    let moves: u64 = summaries.iter().map(|s| s.moves as u64).sum();
    eprintln!(
        "games={} mean_score={:.1} wins={} ({:.1}%) best_tile={} total_moves={}",
        summaries.len(),
        mean_score,
        wins,
        100.0 * wins as f64 / n,
        best_tile,
        moves
    );
}
