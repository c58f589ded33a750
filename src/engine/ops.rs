use rand::Rng;

use super::state::{Board, BoardRaw, Line, Move, Tile, CELLS, MAX_EXPONENT};
use super::tables::Tables;

const ROW_MASK: u64 = 0xffff;

/// Row `line_idx` (0 = top) of a packed board.
#[inline(always)]
pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    ((board >> ((3 - line_idx) * 16)) & ROW_MASK) as Line
}

/// Bit offset of cell `idx` (row-major, 0 = top-left).
#[inline(always)]
pub(crate) fn cell_shift(idx: usize) -> u64 {
    debug_assert!(idx < CELLS);
    ((CELLS - 1 - idx) * 4) as u64
}

/// Split a row into its four exponents, first cell first.
#[inline]
pub(crate) fn line_to_tiles(line: Line) -> [Tile; 4] {
    [
        (line >> 12 & 0xf) as Tile,
        (line >> 8 & 0xf) as Tile,
        (line >> 4 & 0xf) as Tile,
        (line & 0xf) as Tile,
    ]
}

#[inline]
pub(crate) fn tiles_to_line(tiles: [Tile; 4]) -> Line {
    (tiles[0] as Line) << 12 | (tiles[1] as Line) << 8 | (tiles[2] as Line) << 4 | tiles[3] as Line
}

/// Spread four exponents into 16-bit lanes, first cell in the top lane.
#[inline]
pub(crate) fn tiles_to_spread(tiles: [Tile; 4]) -> u64 {
    (tiles[0] as u64) << 48 | (tiles[1] as u64) << 32 | (tiles[2] as u64) << 16 | tiles[3] as u64
}

/// Collapse a row towards its first cell: each equal pair merges once,
/// unequal tiles keep their order.
pub(crate) fn slide_towards_first(tiles: [Tile; 4]) -> [Tile; 4] {
    let mut out = [0; 4];
    let mut pos = 0;
    let mut pending: Tile = 0;
    for &tile in tiles.iter().filter(|&&t| t != 0) {
        if pending == 0 {
            pending = tile;
        } else if pending == tile {
            out[pos] = (tile + 1).min(MAX_EXPONENT);
            pos += 1;
            pending = 0;
        } else {
            out[pos] = pending;
            pos += 1;
            pending = tile;
        }
    }
    if pending != 0 {
        out[pos] = pending;
    }
    out
}

/// Collapse a row towards its last cell.
pub(crate) fn slide_towards_last(mut tiles: [Tile; 4]) -> [Tile; 4] {
    tiles.reverse();
    let mut out = slide_towards_first(tiles);
    out.reverse();
    out
}

/// Transpose a board through the per-row scatter table.
#[inline]
pub fn transpose(tables: &Tables, board: Board) -> Board {
    let b = board.0;
    Board(
        tables.transpose(b & ROW_MASK)
            | tables.transpose(b >> 16 & ROW_MASK) << 4
            | tables.transpose(b >> 32 & ROW_MASK) << 8
            | tables.transpose(b >> 48 & ROW_MASK) << 12,
    )
}

#[inline]
fn shift_rows(tables: &Tables, board: Board, dir: Move) -> Board {
    let b = board.0;
    let lookup = |row: u64| -> u64 {
        match dir {
            Move::Left => tables.move_left(row) as u64,
            Move::Right => tables.move_right(row) as u64,
            Move::Up | Move::Down => unreachable!("column moves go through shift_cols"),
        }
    };
    Board(
        lookup(b & ROW_MASK)
            | lookup(b >> 16 & ROW_MASK) << 16
            | lookup(b >> 32 & ROW_MASK) << 32
            | lookup(b >> 48 & ROW_MASK) << 48,
    )
}

#[inline]
fn shift_cols(tables: &Tables, transposed: Board, dir: Move) -> Board {
    let t = transposed.0;
    let lookup = |col: u64| -> u64 {
        match dir {
            Move::Up => tables.move_up(col),
            Move::Down => tables.move_down(col),
            Move::Left | Move::Right => unreachable!("row moves go through shift_rows"),
        }
    };
    // Spread results already sit in column position, so no second transpose.
    Board(
        lookup(t & ROW_MASK)
            | lookup(t >> 16 & ROW_MASK) << 4
            | lookup(t >> 32 & ROW_MASK) << 8
            | lookup(t >> 48 & ROW_MASK) << 12,
    )
}

/// Slide/merge tiles in the given direction. No randomness.
///
/// A result equal to `board` means the move is illegal.
#[inline]
pub fn shift(tables: &Tables, board: Board, dir: Move) -> Board {
    match dir {
        Move::Left | Move::Right => shift_rows(tables, board, dir),
        Move::Up | Move::Down => shift_cols(tables, transpose(tables, board), dir),
    }
}

/// All four shifted boards in [`Move::ALL`] order, transposing only once.
#[inline]
pub fn shift_all(tables: &Tables, board: Board) -> [Board; 4] {
    let transposed = transpose(tables, board);
    [
        shift_cols(tables, transposed, Move::Up),
        shift_rows(tables, board, Move::Right),
        shift_cols(tables, transposed, Move::Down),
        shift_rows(tables, board, Move::Left),
    ]
}

/// Directions that change the board, in [`Move::ALL`] order.
pub fn legal_moves(tables: &Tables, board: Board) -> Vec<Move> {
    Move::ALL
        .iter()
        .zip(shift_all(tables, board))
        .filter(|(_, moved)| *moved != board)
        .map(|(&dir, _)| dir)
        .collect()
}

/// True if no move in any direction changes the board.
pub fn is_game_over(tables: &Tables, board: Board) -> bool {
    shift_all(tables, board).iter().all(|&moved| moved == board)
}

// Credit to Nneonneo
/// Sum over tiles of the points needed to build them from 2s.
pub(crate) fn tile_score(board: Board) -> u64 {
    let mut raw = board.0;
    let mut score = 0;
    while raw != 0 {
        let tile = raw & 0xf;
        if tile >= 2 {
            score += (tile - 1) * (1 << tile);
        }
        raw >>= 4;
    }
    score
}

/// A fresh tile exponent: 2 (90%) or 4 (10%).
pub(crate) fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 {
        1
    } else {
        2
    }
}
