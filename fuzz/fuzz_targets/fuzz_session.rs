#![no_main]

//! Game session fuzzer.
//!
//! Plays an arbitrary mix of drops and power-ups on a hazard-mode game and
//! checks that the board stays consistent and settled between actions.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mergedrop::board::{COLS, Direction, Pos, ROWS, ShiftDirection, check_invariants, check_settled};
use mergedrop::session::{GameMode, PowerUpConfig};
use mergedrop::{Game, GameConfig};

/// A fuzzer-generated player action.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzAction {
    Drop { col: u8 },
    Shift { right: bool },
    Frenzy,
    FrenzyShift { direction: u8 },
    Swap { a: (u8, u8), b: (u8, u8) },
    ForceMerge { from: (u8, u8), into: (u8, u8) },
    Wildcard,
}

/// Structured input for session fuzzing.
#[derive(Arbitrary, Debug)]
struct SessionInput {
    seed: u64,
    starting_coins: u8,
    actions: Vec<FuzzAction>,
}

fn pos((col, row): (u8, u8)) -> Pos {
    Pos::new(usize::from(col) % (COLS + 1), usize::from(row) % (ROWS + 1))
}

fuzz_target!(|input: SessionInput| {
    let mut game = Game::new(GameConfig {
        seed: input.seed,
        mode: GameMode::Hazards,
        powerups: PowerUpConfig {
            starting_coins: u32::from(input.starting_coins),
            swap_charge: 1,
            ..PowerUpConfig::default()
        },
        ..GameConfig::default()
    });

    for action in input.actions.into_iter().take(200) {
        let before = game.snapshot();
        let accepted = match action {
            FuzzAction::Drop { col } => game.drop_tile(usize::from(col) % (COLS + 1)).is_ok(),
            FuzzAction::Shift { right } => {
                let direction = if right {
                    ShiftDirection::Right
                } else {
                    ShiftDirection::Left
                };
                game.shift(direction).is_ok()
            }
            FuzzAction::Frenzy => game.activate_frenzy().is_ok(),
            FuzzAction::FrenzyShift { direction } => {
                let direction = match direction % 4 {
                    0 => Direction::Left,
                    1 => Direction::Right,
                    2 => Direction::Up,
                    _ => Direction::Down,
                };
                game.frenzy_shift(direction).is_ok()
            }
            FuzzAction::Swap { a, b } => game.swap(pos(a), pos(b)).is_ok(),
            FuzzAction::ForceMerge { from, into } => game.force_merge(pos(from), pos(into)).is_ok(),
            FuzzAction::Wildcard => game.use_wildcard().is_ok(),
        };

        if !accepted {
            assert_eq!(game.snapshot(), before, "rejected action mutated the game");
        }
        let violations = check_invariants(game.board());
        assert!(violations.is_empty(), "Invariants violated: {violations:?}");
        if !game.frenzy_active() {
            assert!(check_settled(game.board().grid()).is_empty());
        }
    }
});
