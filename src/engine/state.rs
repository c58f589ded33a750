use rand::Rng;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ops;
use super::tables;

// Internal type aliases for packed representation
pub(crate) type BoardRaw = u64;
pub(crate) type Line = u16;
pub(crate) type Tile = u8;

/// Number of cells on the board.
pub const CELLS: usize = 16;

/// Largest exponent a nibble can hold (tile 32768).
pub const MAX_EXPONENT: Tile = 0xf;

/// A direction to move/merge tiles.
///
/// Discriminants are the host direction codes: 0=up, 1=right, 2=down, 3=left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Move {
    /// All directions in search order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_code(code: u8) -> Option<Move> {
        Move::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Right => "right",
            Move::Down => "down",
            Move::Left => "left",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid tile value {0}: expected 0 or a power of two up to 32768")]
    InvalidTile(u32),
    #[error("cannot parse board: {0}")]
    Parse(String),
}

/// Encode a raw tile value as its nibble (`log2`), with `0` and `1` meaning empty.
///
/// Only powers of two are meaningful; other inputs yield the floor of `log2`.
///
/// ```
/// use versus_2048::engine::encode_tile_value;
/// assert_eq!(encode_tile_value(0), 0);
/// assert_eq!(encode_tile_value(2), 1);
/// assert_eq!(encode_tile_value(2048), 11);
/// ```
pub fn encode_tile_value(mut value: u32) -> Tile {
    if value <= 1 {
        return 0;
    }
    let mut exponent = 0;
    while value > 1 {
        value >>= 1;
        exponent += 1;
    }
    exponent
}

/// Checked variant of [`encode_tile_value`].
pub fn try_encode_tile_value(value: u32) -> Result<Tile, BoardError> {
    match value {
        0 | 1 => Ok(0),
        v if v.is_power_of_two() && v <= 1 << MAX_EXPONENT => Ok(encode_tile_value(v)),
        v => Err(BoardError::InvalidTile(v)),
    }
}

/// Pack 16 raw tile values (row-major, top-left first) into a board.
pub fn encode_grid(values: &[u32; CELLS]) -> Board {
    let raw = values
        .iter()
        .fold(0u64, |acc, &v| (acc << 4) | encode_tile_value(v) as u64);
    Board(raw)
}

/// Combine four packed rows, top row first.
pub fn encode_rows(r0: Line, r1: Line, r2: Line, r3: Line) -> Board {
    Board((r0 as u64) << 48 | (r1 as u64) << 32 | (r2 as u64) << 16 | r3 as u64)
}

/// Unpack a board into raw tile values (0 for empty), row-major.
pub fn decode_grid(board: Board) -> [u32; CELLS] {
    let mut values = [0u32; CELLS];
    for (idx, slot) in values.iter_mut().enumerate() {
        *slot = board.tile_value(idx);
    }
    values
}

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
///
/// The top-left cell lives in the most significant nibble. Public methods use
/// the process-wide [`tables::global`] tables; the search engine takes an
/// explicit [`tables::Tables`] reference instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board(pub(crate) BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    /// Consume this `Board`, returning the raw packed `u64`.
    #[inline]
    pub fn into_raw(self) -> BoardRaw {
        self.0
    }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.0
    }

    /// Build a board from four packed row words, top row first.
    #[inline]
    pub fn from_rows(rows: [Line; 4]) -> Self {
        encode_rows(rows[0], rows[1], rows[2], rows[3])
    }

    /// The four packed row words, top row first.
    #[inline]
    pub fn rows(self) -> [Line; 4] {
        [
            ops::extract_line(self.0, 0),
            ops::extract_line(self.0, 1),
            ops::extract_line(self.0, 2),
            ops::extract_line(self.0, 3),
        ]
    }

    /// Build a board from raw tile values without validation.
    #[inline]
    pub fn from_values(values: &[u32; CELLS]) -> Self {
        encode_grid(values)
    }

    /// Build a board from raw tile values, rejecting anything that is not a tile.
    ///
    /// ```
    /// use versus_2048::engine::{Board, BoardError};
    /// let mut values = [0u32; 16];
    /// values[0] = 2;
    /// assert!(Board::try_from_values(&values).is_ok());
    /// values[1] = 6;
    /// assert_eq!(Board::try_from_values(&values), Err(BoardError::InvalidTile(6)));
    /// ```
    pub fn try_from_values(values: &[u32; CELLS]) -> Result<Self, BoardError> {
        values.iter().try_fold(0u64, |acc, &v| {
            try_encode_tile_value(v).map(|t| (acc << 4) | t as u64)
        })
        .map(Board)
    }

    /// Raw tile values, row-major.
    #[inline]
    pub fn to_values(self) -> [u32; CELLS] {
        decode_grid(self)
    }

    /// Nibble (exponent) stored at cell `idx` (0..16, row-major).
    #[inline]
    pub fn tile(self, idx: usize) -> Tile {
        ((self.0 >> ops::cell_shift(idx)) & 0xf) as Tile
    }

    /// Actual value at cell `idx` (0 if empty), e.g. 2, 4, 8, ...
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 {
        match self.tile(idx) {
            0 => 0,
            t => 1 << t,
        }
    }

    /// Return a copy with cell `idx` set to the given exponent.
    #[inline]
    pub fn with_tile(self, idx: usize, exponent: Tile) -> Self {
        let shift = ops::cell_shift(idx);
        Board((self.0 & !(0xf << shift)) | ((exponent as u64 & 0xf) << shift))
    }

    /// Row-major indices of empty cells.
    pub fn empty_cells(self) -> impl Iterator<Item = usize> {
        (0..CELLS).filter(move |&idx| self.tile(idx) == 0)
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// Example
    /// ```
    /// use versus_2048::engine::{Board, Move};
    /// let b = Board::from_raw(0x0000_0000_0000_1111);
    /// assert_eq!(b.shift(Move::Left), Board::from_raw(0x0000_0000_0000_2200));
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        ops::shift(tables::global(), self, dir)
    }

    /// Directions that change the board, in search order.
    #[inline]
    pub fn legal_moves(self) -> Vec<Move> {
        ops::legal_moves(tables::global(), self)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// Deterministic example using a seeded RNG:
    /// ```
    /// use versus_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let mut tmp = self.0;
        let mut tile = ops::generate_random_tile(rng) as u64;
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 {
                break;
            }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// Perform a move then insert a random tile if the move changed the board, using the provided RNG.
    ///
    /// ```
    /// use versus_2048::engine::{Board, Move};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let b0 = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// let _b1 = b0.make_move(Move::Up, &mut rng);
    /// ```
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, direction: Move, rng: &mut R) -> Self {
        let moved = self.shift(direction);
        if moved != self {
            moved.with_random_tile(rng)
        } else {
            self
        }
    }

    /// Game score implied by the tiles on the board, assuming every tile was
    /// built from spawned 2s.
    #[inline]
    pub fn score(self) -> u64 {
        ops::tile_score(self)
    }

    /// Static heuristic evaluation used at search leaves.
    #[inline]
    pub fn heuristic_score(self) -> f64 {
        tables::global().heuristic_score(self)
    }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use versus_2048::engine::Board;
    /// // On an empty board, shifting in any direction doesn't change the board.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool {
        ops::is_game_over(tables::global(), self)
    }

    /// Largest exponent on the board.
    #[inline]
    pub fn highest_exponent(self) -> Tile {
        (0..CELLS).map(|idx| self.tile(idx)).max().unwrap_or(0)
    }

    /// Return the highest tile value (e.g., 2048) present on the board.
    #[inline]
    pub fn highest_tile(self) -> u32 {
        match self.highest_exponent() {
            0 => 0,
            t => 1 << t,
        }
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u32 {
        tables::global().count_empty(self)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            if row > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> = (0..4)
                .map(|col| format_val(self.tile_value(row * 4 + col)))
                .collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

/// Parse either four hex row words (`"1234 0000 0001 0021"`, commas allowed)
/// or a single packed hex word (`"0x1234000000010021"`).
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .map(|w| w.trim_start_matches("0x").trim_start_matches("0X"))
            .collect();
        let parse_err = || BoardError::Parse(s.to_string());
        match words.as_slice() {
            [packed] if packed.len() <= 16 => {
                u64::from_str_radix(packed, 16).map(Board).map_err(|_| parse_err())
            }
            [_, _, _, _] => {
                let mut rows = [0 as Line; 4];
                for (slot, word) in rows.iter_mut().zip(&words) {
                    if word.len() > 4 {
                        return Err(parse_err());
                    }
                    *slot = Line::from_str_radix(word, 16).map_err(|_| parse_err())?;
                }
                Ok(Board::from_rows(rows))
            }
            _ => Err(parse_err()),
        }
    }
}

impl From<BoardRaw> for Board {
    fn from(v: BoardRaw) -> Self {
        Board::from_raw(v)
    }
}

impl From<Board> for BoardRaw {
    fn from(b: Board) -> Self {
        b.into_raw()
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => " ".repeat(7),
        v => format!("{:^7}", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn it_encodes_host_log2_mapping() {
        assert_eq!(encode_tile_value(0), 0);
        assert_eq!(encode_tile_value(1), 0);
        for exp in 1..=15u8 {
            assert_eq!(encode_tile_value(1 << exp), exp);
        }
    }

    #[test]
    fn it_rejects_invalid_tiles() {
        assert_eq!(try_encode_tile_value(3), Err(BoardError::InvalidTile(3)));
        assert_eq!(try_encode_tile_value(6), Err(BoardError::InvalidTile(6)));
        assert_eq!(try_encode_tile_value(65536), Err(BoardError::InvalidTile(65536)));
        assert_eq!(try_encode_tile_value(32768), Ok(15));
        assert_eq!(try_encode_tile_value(1), Ok(0));
    }

    #[test]
    fn it_packs_top_left_into_high_nibble() {
        let mut values = [0u32; CELLS];
        values[0] = 2;
        values[15] = 4;
        let b = encode_grid(&values);
        assert_eq!(b, Board::from_raw(0x1000_0000_0000_0002));
        assert_eq!(b.tile(0), 1);
        assert_eq!(b.tile(15), 2);
    }

    #[test]
    fn it_combines_rows_top_first() {
        let b = encode_rows(0x1234, 0x5678, 0x9abc, 0xdef0);
        assert_eq!(b.raw(), 0x1234_5678_9abc_def0);
        assert_eq!(b.rows(), [0x1234, 0x5678, 0x9abc, 0xdef0]);
    }

    #[test]
    fn it_round_trips_grids() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut values = [0u32; CELLS];
            for v in values.iter_mut() {
                let exp: u32 = rng.gen_range(0..=15);
                *v = if exp == 0 { 0 } else { 1 << exp };
            }
            assert_eq!(decode_grid(encode_grid(&values)), values);
        }
    }

    #[test]
    fn it_gets_tile_val() {
        let game = Board::from_raw(0x0123456789abcdef);
        assert_eq!(game.tile_value(0), 0);
        assert_eq!(game.tile_value(3), 8);
        assert_eq!(game.tile_value(10), 1024);
        assert_eq!(game.tile_value(15), 32768);
    }

    #[test]
    fn it_sets_single_cells() {
        let b = Board::EMPTY.with_tile(5, 3).with_tile(15, 1);
        assert_eq!(b.raw(), 0x0000_0300_0000_0001);
        assert_eq!(b.with_tile(5, 0).raw(), 0x0000_0000_0000_0001);
        assert_eq!(b.empty_cells().count(), 14);
    }

    #[test]
    fn it_parses_rows_and_packed_words() {
        let b: Board = "1234 0000 0001 0021".parse().unwrap();
        assert_eq!(b.rows(), [0x1234, 0x0000, 0x0001, 0x0021]);
        let c: Board = "0x1234,0x0000,0x0001,0x0021".parse().unwrap();
        assert_eq!(b, c);
        let d: Board = "1234000000010021".parse().unwrap();
        assert_eq!(b, d);
        assert!("12345 0 0 0".parse::<Board>().is_err());
        assert!("1 2 3".parse::<Board>().is_err());
        assert!("zz".parse::<Board>().is_err());
    }

    #[test]
    fn it_inserts_random_tiles_until_full() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = Board::EMPTY;
        for _ in 0..16 {
            game = game.with_random_tile(&mut rng);
        }
        assert_eq!(game.count_empty(), 0);
        assert_eq!(game.with_random_tile(&mut rng), game);
    }

    #[test]
    fn it_maps_move_codes() {
        for (code, dir) in Move::ALL.iter().enumerate() {
            assert_eq!(dir.code() as usize, code);
            assert_eq!(Move::from_code(code as u8), Some(*dir));
        }
        assert_eq!(Move::from_code(4), None);
    }

    #[test]
    fn it_scores_built_tiles() {
        // a 4 built from two 2s is worth 4 points, an 8 worth 16
        assert_eq!(Board::from_raw(0x2000_0000_0000_0000).score(), 4);
        assert_eq!(Board::from_raw(0x3000_0000_0000_0000).score(), 16);
        assert_eq!(Board::from_raw(0x1000_0000_0000_0000).score(), 0);
    }
}
