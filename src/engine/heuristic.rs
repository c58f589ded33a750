//! Per-row static evaluation feeding the `score` table.

use super::state::Tile;

const BASE: f64 = 2304.0;
const EMPTY_WEIGHT: f64 = 341.0;

const CLOSENESS_WEIGHT: f64 = 22.0;
const EQUAL_FACTOR: f64 = 2.2;
const EQUAL_POWER: f64 = 1.6;
const NEIGHBOUR_POWER: f64 = 1.5;
const GAP_FACTOR: f64 = 1.2;
const GAP_POWER: f64 = 1.6;

const CLUTTER_WEIGHT: f64 = 45.0;
const CLUTTER_POWER: f64 = 1.5;

const EDGE_WEIGHT: f64 = 39.0;
const EDGE_POWER: f64 = 1.5575;

const MONOTONIC_BONUS: f64 = 982.0;

/// Heuristic value of one row (or transposed column) of exponents.
pub(crate) fn line_score(tiles: [Tile; 4]) -> f64 {
    let empty = tiles.iter().filter(|&&t| t == 0).count() as f64;
    let highest = tiles.iter().copied().max().unwrap_or(0);

    BASE + empty * EMPTY_WEIGHT + closeness(&tiles) * CLOSENESS_WEIGHT - clutter(&tiles) * CLUTTER_WEIGHT
        + edge_bonus(&tiles, highest)
        + monotonic_bonus(&tiles)
}

// Rewards equal or adjacent-rank neighbours, punishes wide gaps.
fn closeness(tiles: &[Tile; 4]) -> f64 {
    tiles
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let diff = a.abs_diff(b);
            match diff {
                0 => (a as f64 + 1.0).powf(EQUAL_POWER) * EQUAL_FACTOR,
                1 => (a.max(b) as f64).powf(NEIGHBOUR_POWER),
                _ => -(diff as f64).powf(GAP_POWER) * GAP_FACTOR,
            }
        })
        .sum()
}

fn clutter(tiles: &[Tile; 4]) -> f64 {
    tiles
        .iter()
        .filter(|&&t| t != 0)
        .map(|&t| (t as f64).powf(CLUTTER_POWER))
        .sum()
}

fn edge_bonus(tiles: &[Tile; 4], highest: Tile) -> f64 {
    let magnitude = (highest as f64).powf(EDGE_POWER) * EDGE_WEIGHT;
    if tiles[0] == highest || tiles[3] == highest {
        magnitude
    } else {
        -magnitude
    }
}

fn monotonic_bonus(tiles: &[Tile; 4]) -> f64 {
    let non_increasing = tiles.windows(2).all(|p| p[0] >= p[1]);
    let non_decreasing = tiles.windows(2).all(|p| p[0] <= p[1]);
    if non_increasing || non_decreasing {
        MONOTONIC_BONUS
    } else {
        -MONOTONIC_BONUS
    }
}
