#![no_main]

//! Board engine fuzzer.
//!
//! Builds an arbitrary starting grid (numbers, steel, lead, glass, bombs),
//! then applies a sequence of raw board and special-tile operations,
//! checking invariants after every step.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mergedrop::board::{
    BoardEngine, COLS, Cell, Direction, DropValue, Grid, Pos, ROWS, ShiftDirection, Tile,
    check_invariants, check_settled,
};
use mergedrop::special::{SpecialConfig, SpecialKind, SpecialTile, SpecialTileEngine};

/// A fuzzer-generated board operation.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzOp {
    Drop { col: u8, value: u8, wildcard: bool },
    Gravity,
    Shift { right: bool },
    FrenzyShift { direction: u8 },
    Swap { a: (u8, u8), b: (u8, u8) },
    Merge { from: (u8, u8), into: (u8, u8) },
    Tick,
    OnMerge { at: (u8, u8) },
    Detonate { at: (u8, u8) },
    SpawnSwapper { col: u8 },
}

/// Structured input for board fuzzing.
#[derive(Arbitrary, Debug)]
struct BoardInput {
    /// One code per cell, row-major.
    cells: [u8; COLS * ROWS],
    /// Operations to apply.
    ops: Vec<FuzzOp>,
    /// Seed for the special-tile stream.
    seed: u64,
}

const VALUES: [u32; 6] = [1, 2, 3, 6, 12, 24];

fn value(code: u8) -> u32 {
    VALUES[usize::from(code) % VALUES.len()]
}

fn pos((col, row): (u8, u8)) -> Pos {
    // Allow one step off the board to exercise bounds checks
    Pos::new(usize::from(col) % (COLS + 1), usize::from(row) % (ROWS + 1))
}

fn build_grid(cells: &[u8; COLS * ROWS]) -> Option<Grid> {
    let mut rows = vec![vec![Cell::Empty; COLS]; ROWS];
    for (idx, &code) in cells.iter().enumerate() {
        let id = idx as u64 + 1;
        let kind = match code % 16 {
            0..=5 => None,
            6 => Some(SpecialKind::Steel { turns_remaining: 2 }),
            7 => Some(SpecialKind::Lead { countdown: 2 }),
            8 => Some(SpecialKind::Glass {
                value: value(code >> 4),
                durability: 2,
            }),
            9 => Some(SpecialKind::Bomb {
                value: value(code >> 4),
                merges_remaining: 1,
            }),
            _ => {
                rows[idx / COLS][idx % COLS] = Cell::Number(Tile::new(id, value(code >> 4)));
                continue;
            }
        };
        if let Some(kind) = kind {
            rows[idx / COLS][idx % COLS] = Cell::Special(SpecialTile::new(id, kind));
        }
    }
    Grid::from_rows(&rows)
}

fuzz_target!(|input: BoardInput| {
    let Some(grid) = build_grid(&input.cells) else {
        return;
    };
    let mut board = BoardEngine::from_grid(grid);
    let mut specials = SpecialTileEngine::new(SpecialConfig::default(), input.seed);

    // Settle the arbitrary start so drops see a consistent board
    board.apply_gravity();

    for op in input.ops.into_iter().take(64) {
        let before = board.clone();
        let rejected = match op {
            FuzzOp::Drop {
                col,
                value: code,
                wildcard,
            } => {
                let drop_value = if wildcard {
                    DropValue::Wildcard
                } else {
                    DropValue::Number(value(code))
                };
                board
                    .drop_tile(usize::from(col) % (COLS + 1), drop_value)
                    .is_err()
            }
            FuzzOp::Gravity => {
                board.apply_gravity();
                assert!(check_settled(board.grid()).is_empty());
                false
            }
            FuzzOp::Shift { right } => {
                let direction = if right {
                    ShiftDirection::Right
                } else {
                    ShiftDirection::Left
                };
                board.shift_board(direction);
                false
            }
            FuzzOp::FrenzyShift { direction } => {
                let direction = match direction % 4 {
                    0 => Direction::Left,
                    1 => Direction::Right,
                    2 => Direction::Up,
                    _ => Direction::Down,
                };
                board.frenzy_shift(direction);
                false
            }
            FuzzOp::Swap { a, b } => board.swap_cells(pos(a), pos(b)).is_err(),
            FuzzOp::Merge { from, into } => board.merge_cells(pos(from), pos(into)).is_err(),
            FuzzOp::Tick => {
                specials.update_special_tiles(&mut board);
                false
            }
            FuzzOp::OnMerge { at } => {
                specials.on_merge(&mut board, pos(at));
                false
            }
            FuzzOp::Detonate { at } => {
                let explosion = specials.detonate_bomb(&mut board, pos(at));
                for chained in explosion.chain_reactions() {
                    assert!(board.grid().get(chained).is_some_and(Cell::is_bomb));
                }
                false
            }
            FuzzOp::SpawnSwapper { col } => {
                specials.spawn_auto_swapper(&mut board, Some(usize::from(col) % COLS), None, None);
                false
            }
        };

        if rejected {
            assert_eq!(board, before, "rejected operation mutated the board");
        }
        let violations = check_invariants(&board);
        assert!(violations.is_empty(), "Invariants violated: {violations:?}");
    }
});
