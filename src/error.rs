//! Error types for board operations.

use std::fmt;

use crate::board::Pos;

/// Reasons a board operation is rejected.
///
/// Every variant is an expected gameplay condition. An operation that returns
/// one of these has not touched the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Column index outside `0..COLS`.
    InvalidColumn {
        /// The rejected column.
        col: usize,
    },
    /// No empty cell left in the column.
    ColumnFull {
        /// The full column.
        col: usize,
    },
    /// Two values that the merge rules do not pair.
    IncompatibleMerge {
        /// Value of the moving tile.
        a: u32,
        /// Value of the target tile.
        b: u32,
    },
    /// An auto-swapper has no legal neighbour this tick.
    NoValidSwapTarget {
        /// Position of the swapper.
        pos: Pos,
    },
    /// Coordinates outside the grid.
    OutOfBounds {
        /// The rejected position.
        pos: Pos,
    },
    /// The operation needs a tile but the cell is empty.
    EmptyCell {
        /// The empty position.
        pos: Pos,
    },
    /// Steel and lead cannot be swapped or force-merged.
    Immovable {
        /// Position of the obstacle.
        pos: Pos,
    },
    /// Not a value a tile can carry (1, 2 or 3·2^k).
    InvalidValue {
        /// The rejected value.
        value: u32,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidColumn { col } => write!(f, "Invalid column: {col}"),
            EngineError::ColumnFull { .. } => write!(f, "Column is full"),
            EngineError::IncompatibleMerge { a, b } => {
                write!(f, "Cannot merge {a} with {b}")
            }
            EngineError::NoValidSwapTarget { pos } => {
                write!(f, "No valid swap target next to {pos}")
            }
            EngineError::OutOfBounds { pos } => write!(f, "Position {pos} is off the board"),
            EngineError::EmptyCell { pos } => write!(f, "No tile at {pos}"),
            EngineError::Immovable { pos } => write!(f, "Tile at {pos} cannot be moved"),
            EngineError::InvalidValue { value } => write!(f, "Invalid tile value: {value}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for board operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_full_reason() {
        let err = EngineError::ColumnFull { col: 0 };
        assert_eq!(err.to_string(), "Column is full");
    }

    #[test]
    fn test_display_includes_position() {
        let err = EngineError::Immovable { pos: Pos::new(2, 5) };
        assert!(err.to_string().contains("(2, 5)"));
    }
}
