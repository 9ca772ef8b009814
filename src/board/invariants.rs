//! Board invariants - sanity checks that detect bugs.
//!
//! These should never trigger on a board driven through the public engine
//! operations. A violation means a rule was implemented wrongly.

use std::collections::BTreeSet;

use super::engine::BoardEngine;
use super::grid::{Cell, Grid};
use super::rules::is_valid_tile_value;

/// Sanity bound on tile values. 24 cells cannot build anything close.
pub const SANITY_MAX_TILE_VALUE: u32 = 3 << 24;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all board invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(board: &BoardEngine) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen = BTreeSet::new();

    for (pos, cell) in board.grid().iter() {
        let Some(id) = cell.id() else {
            continue;
        };

        if !seen.insert(id) {
            violations.push(InvariantViolation {
                message: format!("Tile id {id} appears more than once (again at {pos})"),
            });
        }
        if id >= board.next_tile_id() {
            violations.push(InvariantViolation {
                message: format!(
                    "Tile id {id} at {pos} was never issued (next id {})",
                    board.next_tile_id()
                ),
            });
        }

        if let Some(value) = cell.value() {
            if !is_valid_tile_value(value) {
                violations.push(InvariantViolation {
                    message: format!("Tile at {pos} has invalid value {value}"),
                });
            } else if value > SANITY_MAX_TILE_VALUE {
                violations.push(InvariantViolation {
                    message: format!(
                        "Tile at {pos} has value {value} > sanity max {SANITY_MAX_TILE_VALUE}"
                    ),
                });
            }
        }

        if let Cell::Special(special) = cell
            && special.kind.life() == 0
        {
            violations.push(InvariantViolation {
                message: format!(
                    "Special tile {} ({}) at {pos} has an exhausted counter",
                    special.id,
                    special.kind.special_type().as_str()
                ),
            });
        }
    }

    violations
}

/// Check that nothing floats: every tile except steel rests on the floor or
/// on another occupied cell.
#[must_use]
pub fn check_settled(grid: &Grid) -> Vec<InvariantViolation> {
    grid.iter()
        .filter(|(_, cell)| cell.is_occupied() && !cell.is_fixed())
        .filter_map(|(pos, _)| {
            let below = pos.down()?;
            grid.is_empty_at(below).then(|| InvariantViolation {
                message: format!("Tile at {pos} floats above empty {below}"),
            })
        })
        .collect()
}

/// Assert all board invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(board: &BoardEngine) {
    let violations = check_invariants(board);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Board invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_board: &BoardEngine) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DropValue, Pos, ROWS, Tile};
    use crate::special::{SpecialKind, SpecialTile};

    fn create_valid_board() -> BoardEngine {
        let mut board = BoardEngine::new();
        board.drop_tile(0, DropValue::Number(3)).unwrap();
        board.drop_tile(1, DropValue::Number(1)).unwrap();
        board.drop_tile(1, DropValue::Number(3)).unwrap();
        board
    }

    #[test]
    fn test_valid_board_passes() {
        let board = create_valid_board();
        assert!(check_invariants(&board).is_empty());
        assert!(check_settled(board.grid()).is_empty());
    }

    #[test]
    fn test_invalid_value_detected() {
        let mut board = create_valid_board();
        board
            .grid_mut()
            .set(Pos::new(0, ROWS - 1), Cell::Number(Tile::new(1, 5)));

        let violations = check_invariants(&board);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("invalid value"));
    }

    #[test]
    fn test_duplicate_id_detected() {
        let mut board = create_valid_board();
        board
            .grid_mut()
            .set(Pos::new(3, ROWS - 1), Cell::Number(Tile::new(1, 3)));

        let violations = check_invariants(&board);
        assert!(violations.iter().any(|v| v.message.contains("more than once")));
    }

    #[test]
    fn test_exhausted_special_detected() {
        let mut board = create_valid_board();
        let id = board.issue_tile_id();
        board.grid_mut().set(
            Pos::new(2, ROWS - 1),
            Cell::Special(SpecialTile::new(
                id,
                SpecialKind::Glass {
                    value: 3,
                    durability: 0,
                },
            )),
        );

        let violations = check_invariants(&board);
        assert!(violations[0].message.contains("exhausted"));
    }

    #[test]
    fn test_floating_tile_detected() {
        let mut board = create_valid_board();
        let id = board.issue_tile_id();
        board
            .grid_mut()
            .set(Pos::new(3, 0), Cell::Number(Tile::new(id, 3)));

        let violations = check_settled(board.grid());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("floats"));
    }
}
