use rand::{rngs::StdRng, Rng, SeedableRng};
use versus_2048::api::{next_player_move, next_system_tile};
use versus_2048::engine::{decode_grid, encode_grid, encode_rows, Board, Move};
use versus_2048::expectimax::{Expectimax, ExpectimaxConfig};

fn shallow(cap: u8) -> ExpectimaxConfig {
    ExpectimaxConfig { depth_cap: Some(cap), ..ExpectimaxConfig::default() }
}

fn random_board(rng: &mut StdRng) -> Board {
    let mut values = [0u32; 16];
    for v in values.iter_mut() {
        let exp: u32 = rng.gen_range(0..=6);
        *v = if exp == 0 { 0 } else { 1 << exp };
    }
    encode_grid(&values)
}

// Cells along each line of `dir`, ordered from the edge tiles slide towards.
fn lines_towards(dir: Move) -> [[usize; 4]; 4] {
    let mut lines = [[0; 4]; 4];
    for (i, line) in lines.iter_mut().enumerate() {
        for (j, cell) in line.iter_mut().enumerate() {
            *cell = match dir {
                Move::Left => i * 4 + j,
                Move::Right => i * 4 + (3 - j),
                Move::Up => j * 4 + i,
                Move::Down => (3 - j) * 4 + i,
            };
        }
    }
    lines
}

#[test]
fn grids_round_trip() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..100 {
        let b = random_board(&mut rng);
        let values = decode_grid(b);
        assert_eq!(encode_grid(&values), b);
        assert_eq!(decode_grid(encode_grid(&values)), values);
    }
}

#[test]
fn row_of_twos_merges_pairwise() {
    // [2,2,2,2] slides left to [4,4,0,0], not [8,0,0,0]
    let b = encode_rows(0x1111, 0, 0, 0);
    assert_eq!(b.shift(Move::Left).rows(), [0x2200, 0, 0, 0]);
    assert_eq!(b.shift(Move::Right).rows(), [0x0022, 0, 0, 0]);
}

#[test]
fn illegal_moves_have_nothing_to_slide_or_merge() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..2000 {
        let b = random_board(&mut rng);
        for dir in Move::ALL {
            if b.shift(dir) != b {
                continue;
            }
            for line in lines_towards(dir) {
                for pair in line.windows(2) {
                    let (near, far) = (b.tile(pair[0]), b.tile(pair[1]));
                    assert!(!(near == 0 && far != 0), "{b:?} could slide {dir}");
                    assert!(!(near != 0 && near == far), "{b:?} could merge {dir}");
                }
            }
        }
    }
}

#[test]
fn legal_moves_never_lose_empty_cells() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..2000 {
        let b = random_board(&mut rng);
        for dir in Move::ALL {
            let moved = b.shift(dir);
            if moved != b {
                assert!(moved.count_empty() >= b.count_empty());
            }
        }
    }
}

#[test]
fn empty_board_takes_the_no_move_path() {
    assert_eq!(next_player_move([0, 0, 0, 0]), Move::Up.code());
    let mut ex = Expectimax::with_config(shallow(3));
    assert_eq!(ex.best_move(Board::EMPTY), None);
}

#[test]
fn crowded_twos_choose_a_merging_move() {
    // Fifteen 2s and one empty cell.
    let b = Board::from_raw(0x1111_1111_1111_1110);
    let mut ex = Expectimax::with_config(shallow(3));
    let dir = ex.best_move(b).unwrap();
    let moved = b.shift(dir);
    assert_ne!(moved, b);
    assert!(moved.count_empty() > b.count_empty());
}

#[test]
fn queries_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(77);
    let boards: Vec<Board> = (0..4).map(|_| random_board(&mut rng)).collect();
    for &b in &boards {
        let first = Expectimax::with_config(shallow(3)).best_move(b);
        let second = Expectimax::with_config(shallow(3)).best_move(b);
        assert_eq!(first, second);
        let first = Expectimax::with_config(shallow(3)).worst_spawn_cell(b);
        let second = Expectimax::with_config(shallow(3)).worst_spawn_cell(b);
        assert_eq!(first, second);
    }
}

#[test]
fn warmed_cache_from_other_queries_does_not_leak() {
    let target = Board::from_raw(0x2110_1000_0100_0000);
    let expected_move = Expectimax::with_config(shallow(4)).best_move(target);
    let expected_cell = Expectimax::with_config(shallow(4)).worst_spawn_cell(target);

    let mut ex = Expectimax::with_config(shallow(4));
    // Leave entries from deeper and shallower roots behind.
    let _ = ex.best_move(Board::from_raw(0x1212_2121_1212_2100));
    let _ = ex.worst_spawn_cell(Board::from_raw(0x1100_0000_0000_0000));
    assert_eq!(ex.best_move(target), expected_move);
    let _ = ex.best_move(Board::from_raw(0x3300_0000_0000_0001));
    assert_eq!(ex.worst_spawn_cell(target), expected_cell);
}

#[test]
fn host_spawn_query_picks_the_only_free_cell() {
    assert_eq!(next_system_tile([0x1212, 0x2121, 0x1202, 0x2121]), 10);
}
