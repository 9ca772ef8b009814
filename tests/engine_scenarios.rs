//! End-to-end board scenarios.
//!
//! Run with: cargo test --release engine_scenarios

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use mergedrop::board::{
    BoardEngine, COLS, Cell, DropValue, Grid, Operation, Pos, ROWS, Tile, check_settled,
};
use mergedrop::special::{BlastEffect, SpecialConfig, SpecialEvent, SpecialTileEngine};
use mergedrop::{EngineError, Game, GameConfig};

/// Build a board from `(col, row, value)` tiles, ids assigned in order.
fn board_with(tiles: &[(usize, usize, u32)]) -> BoardEngine {
    let mut rows = vec![vec![Cell::Empty; COLS]; ROWS];
    for (i, &(col, row, value)) in tiles.iter().enumerate() {
        rows[row][col] = Cell::Number(Tile::new(i as u64 + 1, value));
    }
    BoardEngine::from_grid(Grid::from_rows(&rows).unwrap())
}

fn value_at(board: &BoardEngine, col: usize, row: usize) -> Option<u32> {
    board.grid().get(Pos::new(col, row)).and_then(Cell::value)
}

#[test]
fn test_basic_merge() {
    let mut board = BoardEngine::new();

    let first = board.drop_tile(0, DropValue::Number(1)).unwrap();
    assert_eq!(first.final_row, ROWS - 1);
    assert!(!first.merged);

    let second = board.drop_tile(0, DropValue::Number(2)).unwrap();
    assert!(second.merged);
    assert_eq!(second.final_value, 3);
    assert_eq!(second.final_row, ROWS - 1);
    assert_eq!(value_at(&board, 0, ROWS - 1), Some(3));
    assert!(board.grid().is_empty_at(Pos::new(0, ROWS - 2)));
    assert_eq!(board.score(), 3);
    assert_eq!(board.tiles_created().get(&3), Some(&1));
}

#[test]
fn test_column_full() {
    let mut board = BoardEngine::new();
    for value in [1, 3, 1, 3, 1, 3] {
        let result = board.drop_tile(0, DropValue::Number(value)).unwrap();
        assert!(!result.merged);
    }
    assert!(board.grid().is_column_full(0));

    let before = board.clone();
    let err = board.drop_tile(0, DropValue::Number(2)).unwrap_err();
    assert_eq!(err, EngineError::ColumnFull { col: 0 });
    assert_eq!(err.to_string(), "Column is full");
    assert_eq!(board, before);
}

#[test]
fn test_chain_gravity_in_one_call() {
    // Column 0 bottom to top: 3, gap, 3, 6.
    let mut board = board_with(&[(0, ROWS - 1, 3), (0, ROWS - 3, 3), (0, ROWS - 4, 6)]);

    let operations = board.apply_gravity();
    let fall_merges = operations
        .iter()
        .filter(|op| matches!(op, Operation::FallMerge { .. }))
        .count();
    assert_eq!(fall_merges, 2);
    assert_eq!(value_at(&board, 0, ROWS - 1), Some(12));
    assert_eq!(board.grid().occupied(), 1);
    assert!(check_settled(board.grid()).is_empty());

    // Nothing left for a second call.
    assert!(board.apply_gravity().is_empty());
}

#[test]
fn test_bomb_chain() {
    let mut board = BoardEngine::new();
    let mut specials = SpecialTileEngine::new(SpecialConfig::default(), 3);
    let first = specials
        .spawn_bomb(&mut board, Some(1), Some(ROWS - 1), Some(3))
        .unwrap();
    let second = specials
        .spawn_bomb(&mut board, Some(2), Some(ROWS - 1), Some(6))
        .unwrap();

    let explosion = specials.detonate_bomb(&mut board, first.pos);
    assert!(explosion.detonated);
    assert!(board.grid().is_empty_at(first.pos));

    let chained: Vec<_> = explosion
        .affected
        .iter()
        .filter(|tile| tile.effect == BlastEffect::ChainReaction)
        .collect();
    assert_eq!(chained.len(), 1);
    assert_eq!(chained[0].id, second.id);
    // Not detonated inline.
    assert!(board.grid().get(second.pos).unwrap().is_bomb());
    assert_eq!(specials.stats().bombs_detonated, 1);

    let follow_up = specials.detonate_bomb(&mut board, second.pos);
    assert!(follow_up.detonated);
    assert_eq!(board.grid().occupied(), 0);
}

#[test]
fn test_blast_stays_in_box() {
    let mut board = BoardEngine::new();
    for col in 0..COLS {
        for _ in 0..3 {
            board.drop_tile(col, DropValue::Number(3)).ok();
        }
    }
    let mut specials = SpecialTileEngine::new(SpecialConfig::default(), 3);
    let bomb = specials
        .spawn_bomb(&mut board, Some(0), None, Some(1))
        .unwrap();
    let before = board.clone();

    let explosion = specials.detonate_bomb(&mut board, bomb.pos);
    for (pos, cell) in before.grid().iter() {
        let inside = pos.col.abs_diff(bomb.pos.col) <= 1 && pos.row.abs_diff(bomb.pos.row) <= 1;
        if !inside {
            assert_eq!(board.grid().get(pos), Some(cell));
        }
    }
    for tile in &explosion.affected {
        assert!(tile.pos.col.abs_diff(bomb.pos.col) <= 1);
        assert!(tile.pos.row.abs_diff(bomb.pos.row) <= 1);
    }
}

#[test]
fn test_steel_blocks_then_expires() {
    let mut board = BoardEngine::new();
    let mut specials = SpecialTileEngine::new(
        SpecialConfig {
            steel_turns: 2,
            ..SpecialConfig::default()
        },
        1,
    );
    let steel = specials
        .spawn_steel_plate(&mut board, Some(0), Some(ROWS - 1))
        .unwrap();

    board.drop_tile(0, DropValue::Number(1)).unwrap();
    assert_eq!(value_at(&board, 0, ROWS - 2), Some(1));

    let events = specials.update_special_tiles(&mut board);
    assert!(matches!(
        events[0],
        SpecialEvent::SteelTick { turns_remaining: 1, .. }
    ));
    let events = specials.update_special_tiles(&mut board);
    assert_eq!(
        events[0],
        SpecialEvent::SteelRemoved {
            id: steel.id,
            pos: steel.pos
        }
    );

    board.apply_gravity();
    assert_eq!(value_at(&board, 0, ROWS - 1), Some(1));
    assert_eq!(specials.stats().steel_expired, 1);
}

#[test]
fn test_lead_clears_and_counts() {
    let mut board = BoardEngine::new();
    let mut specials = SpecialTileEngine::new(
        SpecialConfig {
            lead_countdown: 1,
            ..SpecialConfig::default()
        },
        1,
    );
    specials.spawn_lead_tile(&mut board, Some(3), None).unwrap();

    let events = specials.update_special_tiles(&mut board);
    assert!(events[0].is_removal());
    assert_eq!(board.grid().occupied(), 0);
    assert_eq!(specials.stats().lead_cleared, 1);
}

#[test]
fn test_glass_cracks_on_adjacent_merge() {
    let mut board = BoardEngine::new();
    let mut specials = SpecialTileEngine::new(
        SpecialConfig {
            glass_durability: 2,
            ..SpecialConfig::default()
        },
        1,
    );
    let glass = specials
        .spawn_glass_tile(&mut board, Some(1), Some(ROWS - 1), Some(6))
        .unwrap();
    board.drop_tile(0, DropValue::Number(1)).unwrap();
    let result = board.drop_tile(0, DropValue::Number(2)).unwrap();
    let site = result.merge_site().unwrap();

    let events = specials.on_merge(&mut board, site.at);
    assert_eq!(
        events,
        vec![SpecialEvent::GlassCracked {
            id: glass.id,
            pos: glass.pos,
            durability: 1
        }]
    );

    board.drop_tile(0, DropValue::Number(3)).unwrap();
    let events = specials.on_merge(&mut board, Pos::new(0, ROWS - 1));
    assert_eq!(
        events,
        vec![SpecialEvent::GlassBroken {
            id: glass.id,
            pos: glass.pos,
            value: 6
        }]
    );
    assert!(board.grid().is_empty_at(glass.pos));
    assert_eq!(specials.stats().glass_broken, 1);
}

#[test]
fn test_failed_game_drop_changes_nothing() {
    let mut game = Game::new(GameConfig {
        seed: 8,
        ..GameConfig::default()
    });
    let before = game.snapshot();
    assert!(game.drop_tile(COLS).is_err());
    assert_eq!(game.snapshot(), before);
}
