//! One-step shifts for the shift and frenzy power-ups.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::{BoardEngine, Operation};
use super::grid::{COLS, Pos, ROWS};

/// Direction of a frenzy shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
    /// Towards row 0.
    Up,
    /// Towards the bottom row.
    Down,
}

/// Direction of the horizontal shift power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftDirection {
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

impl From<ShiftDirection> for Direction {
    fn from(direction: ShiftDirection) -> Self {
        match direction {
            ShiftDirection::Left => Direction::Left,
            ShiftDirection::Right => Direction::Right,
        }
    }
}

impl Direction {
    /// Lines of the board, each ordered from the wall this direction pushes
    /// towards.
    fn lines(self) -> Vec<Vec<Pos>> {
        match self {
            Direction::Left => (0..ROWS)
                .map(|row| (0..COLS).map(|col| Pos::new(col, row)).collect())
                .collect(),
            Direction::Right => (0..ROWS)
                .map(|row| (0..COLS).rev().map(|col| Pos::new(col, row)).collect())
                .collect(),
            Direction::Up => (0..COLS)
                .map(|col| (0..ROWS).map(|row| Pos::new(col, row)).collect())
                .collect(),
            Direction::Down => (0..COLS)
                .map(|col| (0..ROWS).rev().map(|row| Pos::new(col, row)).collect())
                .collect(),
        }
    }
}

impl BoardEngine {
    /// Shift every row one step left or right, merging where possible.
    pub fn shift_board(&mut self, direction: ShiftDirection) -> Vec<Operation> {
        self.frenzy_shift(direction.into())
    }

    /// Shift every row or column one step, merging where possible.
    ///
    /// Each tile moves at most one cell. A cell that received a merge in this
    /// pass takes no second merge. Steel never moves and blocks; lead moves
    /// but never merges. Gravity is not applied.
    pub fn frenzy_shift(&mut self, direction: Direction) -> Vec<Operation> {
        let mut operations = Vec::new();
        for line in direction.lines() {
            self.shift_line(&line, &mut operations);
        }
        debug!(?direction, count = operations.len(), "board shifted");
        operations
    }

    fn shift_line(&mut self, line: &[Pos], operations: &mut Vec<Operation>) {
        let mut merged = vec![false; line.len()];
        for idx in 1..line.len() {
            let (from, to) = (line[idx], line[idx - 1]);
            let Some(&cell) = self.grid().get(from) else {
                continue;
            };
            let Some(id) = cell.id() else {
                continue;
            };
            if cell.is_fixed() {
                continue;
            }

            if self.grid().is_empty_at(to) {
                let moving = self.grid_mut().take(from);
                self.grid_mut().set(to, moving);
                operations.push(Operation::Move {
                    id,
                    from,
                    to,
                    value: cell.value(),
                });
            } else if !merged[idx - 1]
                && let Some((value, merge)) = self.combine(cell, to)
            {
                self.grid_mut().take(from);
                merged[idx - 1] = true;
                operations.push(Operation::Merge {
                    id,
                    from,
                    to,
                    value,
                    merge,
                });
            }
        }
    }
}
