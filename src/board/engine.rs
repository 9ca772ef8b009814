//! Board engine: drops, forced merges and swaps.
//!
//! Gravity and shifts live in sibling modules as further `impl BoardEngine`
//! blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::grid::{COLS, Cell, Grid, Pos, Tile, TileId};
use super::rules::{DropValue, can_merge, is_valid_tile_value, merged_value};
use crate::error::{EngineError, EngineResult};

/// How a merge combined its two tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    /// Two mergeable tiles, neither a bomb.
    Plain,
    /// One side was a bomb; the bomb holds the result.
    Bomb,
    /// Both sides were bombs; the stationary one holds the result.
    BombPair,
}

/// Where a merge happened, for the special-tile hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSite {
    /// Cell the moving tile left.
    pub from: Pos,
    /// Cell holding the merged result.
    pub at: Pos,
    /// Merged value.
    pub value: u32,
    /// Bomb involvement.
    pub kind: MergeKind,
}

/// A single tile movement reported by shifts and gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    /// Horizontal (or frenzy vertical) move into an empty cell.
    Move {
        /// Moving tile.
        id: TileId,
        /// Origin.
        from: Pos,
        /// Destination.
        to: Pos,
        /// Value of the tile, `None` for lead.
        value: Option<u32>,
    },
    /// Move into a compatible neighbour, merging with it.
    Merge {
        /// Moving tile.
        id: TileId,
        /// Origin.
        from: Pos,
        /// The cell merged with.
        to: Pos,
        /// Merged value.
        value: u32,
        /// Bomb involvement.
        merge: MergeKind,
    },
    /// Gravity fall into empty space.
    Fall {
        /// Falling tile.
        id: TileId,
        /// Column.
        col: usize,
        /// Starting row.
        from_row: usize,
        /// Resting row.
        to_row: usize,
        /// Value of the tile, `None` for lead.
        value: Option<u32>,
    },
    /// Gravity fall ending in a merge with the tile below.
    FallMerge {
        /// Falling tile.
        id: TileId,
        /// Column.
        col: usize,
        /// Starting row.
        from_row: usize,
        /// Row of the tile merged with.
        to_row: usize,
        /// Merged value.
        value: u32,
        /// Bomb involvement.
        merge: MergeKind,
    },
}

impl Operation {
    /// Id of the tile that moved.
    #[must_use]
    pub const fn id(&self) -> TileId {
        match self {
            Operation::Move { id, .. }
            | Operation::Merge { id, .. }
            | Operation::Fall { id, .. }
            | Operation::FallMerge { id, .. } => *id,
        }
    }

    /// Merge position, value and kind, if this operation merged.
    #[must_use]
    pub const fn merge_site(&self) -> Option<MergeSite> {
        match *self {
            Operation::Merge {
                from,
                to,
                value,
                merge,
                ..
            } => Some(MergeSite {
                from,
                at: to,
                value,
                kind: merge,
            }),
            Operation::FallMerge {
                col,
                from_row,
                to_row,
                value,
                merge,
                ..
            } => Some(MergeSite {
                from: Pos::new(col, from_row),
                at: Pos::new(col, to_row),
                value,
                kind: merge,
            }),
            Operation::Move { .. } | Operation::Fall { .. } => None,
        }
    }
}

/// Outcome of a successful drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropResult {
    /// Id issued to the dropped tile.
    pub tile_id: TileId,
    /// Column dropped into.
    pub col: usize,
    /// Lowest empty row the tile fell to.
    pub row: usize,
    /// Row the tile (or its merge result) ended up on.
    pub final_row: usize,
    /// Value in the final cell.
    pub final_value: u32,
    /// Whether the drop merged with the tile below.
    pub merged: bool,
    /// Row of the merge, if any.
    pub merged_row: Option<usize>,
    /// Bomb involvement of the merge, if any.
    pub merge_kind: Option<MergeKind>,
}

impl DropResult {
    /// Merge position for the special-tile hooks.
    #[must_use]
    pub fn merge_site(&self) -> Option<MergeSite> {
        let row = self.merged_row?;
        Some(MergeSite {
            from: Pos::new(self.col, self.row),
            at: Pos::new(self.col, row),
            value: self.final_value,
            kind: self.merge_kind.unwrap_or(MergeKind::Plain),
        })
    }
}

/// Owner of the grid and the board counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEngine {
    grid: Grid,
    score: u64,
    moves_used: u32,
    merge_count: u32,
    tiles_created: BTreeMap<u32, u32>,
    next_tile_id: TileId,
}

impl BoardEngine {
    /// Create an engine with an empty grid.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            grid: Grid::new(),
            score: 0,
            moves_used: 0,
            merge_count: 0,
            tiles_created: BTreeMap::new(),
            next_tile_id: 1,
        }
    }

    /// Create an engine around an existing grid.
    ///
    /// Counters start at zero and the next id follows the highest id present.
    #[must_use]
    pub fn from_grid(grid: Grid) -> Self {
        let next_tile_id = grid
            .cells()
            .iter()
            .filter_map(Cell::id)
            .max()
            .map_or(1, |id| id + 1);
        Self {
            grid,
            next_tile_id,
            ..Self::new()
        }
    }

    /// Rebuild an engine from persisted counters.
    pub(crate) const fn from_parts(
        grid: Grid,
        score: u64,
        moves_used: u32,
        merge_count: u32,
        tiles_created: BTreeMap<u32, u32>,
        next_tile_id: TileId,
    ) -> Self {
        Self {
            grid,
            score,
            moves_used,
            merge_count,
            tiles_created,
            next_tile_id,
        }
    }

    /// Get the grid.
    #[must_use]
    #[inline]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    pub(crate) const fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Total score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Successful drops so far.
    #[must_use]
    pub const fn moves_used(&self) -> u32 {
        self.moves_used
    }

    /// Merges banked towards the swap power-up.
    #[must_use]
    pub const fn merge_count(&self) -> u32 {
        self.merge_count
    }

    /// How many tiles of each value merges have produced.
    #[must_use]
    pub const fn tiles_created(&self) -> &BTreeMap<u32, u32> {
        &self.tiles_created
    }

    /// Id the next tile will receive.
    #[must_use]
    pub const fn next_tile_id(&self) -> TileId {
        self.next_tile_id
    }

    /// Highest value on the board.
    #[must_use]
    pub fn highest_tile(&self) -> u32 {
        self.grid.max_value()
    }

    /// Issue a fresh tile id.
    pub(crate) const fn issue_tile_id(&mut self) -> TileId {
        let id = self.next_tile_id;
        self.next_tile_id += 1;
        id
    }

    /// Add points to the score.
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Spend `n` banked merges. Returns `false` (and spends nothing) if fewer
    /// are banked.
    pub fn consume_merges(&mut self, n: u32) -> bool {
        if self.merge_count < n {
            return false;
        }
        self.merge_count -= n;
        true
    }

    /// Clear the banked merges.
    pub const fn reset_merge_count(&mut self) {
        self.merge_count = 0;
    }

    /// Drop a tile into a column.
    ///
    /// The tile falls to the lowest empty row. If the cell directly below can
    /// merge with it, the two combine in the lower cell.
    ///
    /// # Errors
    ///
    /// `InvalidColumn`, `InvalidValue` or `ColumnFull`. The board is untouched
    /// on error.
    pub fn drop_tile(&mut self, col: usize, value: DropValue) -> EngineResult<DropResult> {
        if col >= COLS {
            return Err(EngineError::InvalidColumn { col });
        }
        if let DropValue::Number(v) = value
            && !is_valid_tile_value(v)
        {
            return Err(EngineError::InvalidValue { value: v });
        }
        let row = self
            .grid
            .lowest_empty_row(col)
            .ok_or(EngineError::ColumnFull { col })?;

        let target = Pos::new(col, row);
        let below = target.down();
        let below_value = below.and_then(|pos| self.grid.get(pos)).and_then(Cell::value);
        let value = value.resolve(below_value);

        let tile_id = self.issue_tile_id();
        self.moves_used += 1;
        let moving = Cell::Number(Tile::new(tile_id, value));

        if let Some(below) = below
            && let Some((merged, kind)) = self.combine(moving, below)
        {
            debug!(col, row = below.row, value = merged, "drop merged");
            return Ok(DropResult {
                tile_id,
                col,
                row,
                final_row: below.row,
                final_value: merged,
                merged: true,
                merged_row: Some(below.row),
                merge_kind: Some(kind),
            });
        }

        self.grid.set(target, moving);
        trace!(col, row, value, "drop placed");
        Ok(DropResult {
            tile_id,
            col,
            row,
            final_row: row,
            final_value: value,
            merged: false,
            merged_row: None,
            merge_kind: None,
        })
    }

    /// Exchange two occupied cells.
    ///
    /// # Errors
    ///
    /// `OutOfBounds`, `EmptyCell`, or `Immovable` for steel and lead.
    pub fn swap_cells(&mut self, a: Pos, b: Pos) -> EngineResult<()> {
        self.movable_cell(a)?;
        self.movable_cell(b)?;
        self.grid.swap(a, b);
        debug!(%a, %b, "cells swapped");
        Ok(())
    }

    /// Force the tile at `from` to merge into the tile at `into`.
    ///
    /// The cells need not be adjacent. The result follows the usual rules for
    /// merges involving bombs.
    ///
    /// # Errors
    ///
    /// `OutOfBounds`, `EmptyCell`, `Immovable` for steel and lead, or
    /// `IncompatibleMerge`.
    pub fn merge_cells(&mut self, from: Pos, into: Pos) -> EngineResult<Operation> {
        let moving = self.movable_cell(from)?;
        let target = self.movable_cell(into)?;
        let (Some(a), Some(b)) = (moving.value(), target.value()) else {
            return Err(EngineError::Immovable { pos: from });
        };
        if from == into || !can_merge(a, b) {
            return Err(EngineError::IncompatibleMerge { a, b });
        }

        let moving = self.grid.take(from);
        let Some((value, merge)) = self.combine(moving, into) else {
            self.grid.set(from, moving);
            return Err(EngineError::IncompatibleMerge { a, b });
        };
        debug!(%from, %into, value, "forced merge");
        Ok(Operation::Merge {
            id: moving.id().unwrap_or_default(),
            from,
            to: into,
            value,
            merge,
        })
    }

    /// Occupant of `pos`, rejecting empty cells and obstacles.
    fn movable_cell(&self, pos: Pos) -> EngineResult<Cell> {
        let cell = *self.grid.get(pos).ok_or(EngineError::OutOfBounds { pos })?;
        if cell.is_empty() {
            return Err(EngineError::EmptyCell { pos });
        }
        if cell.is_obstacle() {
            return Err(EngineError::Immovable { pos });
        }
        Ok(cell)
    }

    /// Merge `moving` into the occupant of `target`.
    ///
    /// Returns `None` and leaves the grid alone if the two cannot merge.
    /// The caller is responsible for clearing the moving tile's old cell.
    pub(super) fn combine(&mut self, moving: Cell, target: Pos) -> Option<(u32, MergeKind)> {
        let stationary = *self.grid.get(target)?;
        let (a, b) = (moving.value()?, stationary.value()?);
        if !can_merge(a, b) {
            return None;
        }
        let value = merged_value(a, b);

        let (result, kind) = match (moving, stationary) {
            (Cell::Special(m), Cell::Special(s)) if m.is_bomb() && s.is_bomb() => (
                Cell::Special(s.with_value(value)),
                MergeKind::BombPair,
            ),
            (_, Cell::Special(s)) if s.is_bomb() => {
                (Cell::Special(s.with_value(value)), MergeKind::Bomb)
            }
            (Cell::Special(m), _) if m.is_bomb() => {
                (Cell::Special(m.with_value(value)), MergeKind::Bomb)
            }
            _ => (
                Cell::Number(Tile::new(moving.id()?, value)),
                MergeKind::Plain,
            ),
        };

        self.grid.set(target, result);
        self.record_merge(value);
        Some((value, kind))
    }

    fn record_merge(&mut self, value: u32) {
        self.merge_count += 1;
        *self.tiles_created.entry(value).or_insert(0) += 1;
        self.add_score(u64::from(value));
    }
}

impl Default for BoardEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ROWS;
    use crate::special::{SpecialKind, SpecialTile};

    fn bomb(id: TileId, value: u32) -> Cell {
        Cell::Special(SpecialTile::new(
            id,
            SpecialKind::Bomb {
                value,
                merges_remaining: 2,
            },
        ))
    }

    #[test]
    fn test_drop_lands_on_bottom() {
        let mut board = BoardEngine::new();
        let result = board.drop_tile(0, DropValue::Number(1)).unwrap();
        assert_eq!(result.row, ROWS - 1);
        assert_eq!(result.final_row, ROWS - 1);
        assert!(!result.merged);
        assert_eq!(board.moves_used(), 1);
    }

    #[test]
    fn test_drop_merges_with_below() {
        let mut board = BoardEngine::new();
        board.drop_tile(0, DropValue::Number(1)).unwrap();
        let result = board.drop_tile(0, DropValue::Number(2)).unwrap();

        assert!(result.merged);
        assert_eq!(result.final_value, 3);
        assert_eq!(result.final_row, ROWS - 1);
        assert!(board.grid().is_empty_at(Pos::new(0, ROWS - 2)));
        assert_eq!(board.merge_count(), 1);
        assert_eq!(board.score(), 3);
        assert_eq!(board.tiles_created().get(&3), Some(&1));
    }

    #[test]
    fn test_drop_rejections_leave_board_untouched() {
        let mut board = BoardEngine::new();
        board.drop_tile(1, DropValue::Number(3)).unwrap();
        let before = board.clone();

        assert_eq!(
            board.drop_tile(COLS, DropValue::Number(1)),
            Err(EngineError::InvalidColumn { col: COLS })
        );
        assert_eq!(
            board.drop_tile(0, DropValue::Number(5)),
            Err(EngineError::InvalidValue { value: 5 })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_wildcard_matches_below() {
        let mut board = BoardEngine::new();
        board.drop_tile(2, DropValue::Number(12)).unwrap();
        let result = board.drop_tile(2, DropValue::Wildcard).unwrap();
        assert!(result.merged);
        assert_eq!(result.final_value, 24);
    }

    #[test]
    fn test_drop_onto_bomb_keeps_bomb() {
        let mut grid = Grid::new();
        grid.set(Pos::new(0, ROWS - 1), bomb(9, 3));
        let mut board = BoardEngine::from_grid(grid);
        assert_eq!(board.next_tile_id(), 10);

        let result = board.drop_tile(0, DropValue::Number(3)).unwrap();
        assert_eq!(result.merge_kind, Some(MergeKind::Bomb));
        let cell = board.grid().get(Pos::new(0, ROWS - 1)).unwrap();
        assert_eq!(cell.id(), Some(9));
        assert_eq!(cell.value(), Some(6));
    }

    #[test]
    fn test_merge_cells_bomb_pair() {
        let mut grid = Grid::new();
        grid.set(Pos::new(0, ROWS - 1), bomb(1, 6));
        grid.set(Pos::new(1, ROWS - 1), bomb(2, 6));
        let mut board = BoardEngine::from_grid(grid);

        let op = board
            .merge_cells(Pos::new(0, ROWS - 1), Pos::new(1, ROWS - 1))
            .unwrap();
        let site = op.merge_site().unwrap();
        assert_eq!(site.kind, MergeKind::BombPair);
        assert_eq!(site.value, 12);
        assert!(board.grid().is_empty_at(Pos::new(0, ROWS - 1)));
        assert_eq!(board.grid().find(2), Some(Pos::new(1, ROWS - 1)));
    }

    #[test]
    fn test_swap_rejects_obstacles() {
        let mut grid = Grid::new();
        grid.set(
            Pos::new(0, ROWS - 1),
            Cell::Special(SpecialTile::new(1, SpecialKind::Lead { countdown: 3 })),
        );
        grid.set(Pos::new(1, ROWS - 1), Cell::Number(Tile::new(2, 3)));
        let mut board = BoardEngine::from_grid(grid);

        assert_eq!(
            board.swap_cells(Pos::new(0, ROWS - 1), Pos::new(1, ROWS - 1)),
            Err(EngineError::Immovable {
                pos: Pos::new(0, ROWS - 1)
            })
        );
        assert_eq!(
            board.swap_cells(Pos::new(1, ROWS - 1), Pos::new(1, 0)),
            Err(EngineError::EmptyCell { pos: Pos::new(1, 0) })
        );
    }

    #[test]
    fn test_consume_merges() {
        let mut board = BoardEngine::new();
        board.drop_tile(0, DropValue::Number(1)).unwrap();
        board.drop_tile(0, DropValue::Number(2)).unwrap();
        assert!(!board.consume_merges(2));
        assert!(board.consume_merges(1));
        assert_eq!(board.merge_count(), 0);
    }
}
