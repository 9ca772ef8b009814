//! Grid, cell and position types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::special::{SpecialKind, SpecialTile};

/// Number of columns on the board.
pub const COLS: usize = 4;

/// Number of rows on the board. Row 0 is the top.
pub const ROWS: usize = 6;

/// Total number of cells.
const CELL_COUNT: usize = COLS * ROWS;

/// Identifier issued to every tile instance. Never reused.
pub type TileId = u64;

/// A position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    /// Column (0 = left).
    pub col: usize,
    /// Row (0 = top).
    pub row: usize,
}

impl Pos {
    /// Create a new position.
    #[must_use]
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Check if the position is on the board.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.col < COLS && self.row < ROWS
    }

    /// Offset by a signed delta, returning `None` if the result leaves the board.
    #[must_use]
    pub fn offset(self, dcol: isize, drow: isize) -> Option<Pos> {
        let col = self.col.checked_add_signed(dcol)?;
        let row = self.row.checked_add_signed(drow)?;
        let pos = Pos::new(col, row);
        pos.in_bounds().then_some(pos)
    }

    /// Cell one column to the left.
    #[must_use]
    pub fn left(self) -> Option<Pos> {
        self.offset(-1, 0)
    }

    /// Cell one column to the right.
    #[must_use]
    pub fn right(self) -> Option<Pos> {
        self.offset(1, 0)
    }

    /// Cell one row up.
    #[must_use]
    pub fn up(self) -> Option<Pos> {
        self.offset(0, -1)
    }

    /// Cell one row down.
    #[must_use]
    pub fn down(self) -> Option<Pos> {
        self.offset(0, 1)
    }

    /// Orthogonal neighbours (up, down, left, right).
    ///
    /// Returns a fixed-size array and count to avoid heap allocation.
    /// The array contains valid positions in indices 0..count.
    #[must_use]
    #[inline]
    pub fn orthogonal(self) -> ([Pos; 4], u8) {
        let mut result = [self; 4];
        let mut count = 0u8;
        for neighbour in [self.up(), self.down(), self.left(), self.right()]
            .into_iter()
            .flatten()
        {
            result[count as usize] = neighbour;
            count += 1;
        }
        (result, count)
    }

    /// The 3×3 box centred on this position, clipped to the board.
    ///
    /// The centre comes first, then the neighbours in row-major order.
    #[must_use]
    pub fn neighborhood(self) -> ([Pos; 9], u8) {
        let mut result = [self; 9];
        let mut count = 1u8;
        for drow in -1..=1 {
            for dcol in -1..=1 {
                if dcol == 0 && drow == 0 {
                    continue;
                }
                if let Some(pos) = self.offset(dcol, drow) {
                    result[count as usize] = pos;
                    count += 1;
                }
            }
        }
        (result, count)
    }

    /// Flat index into row-major storage.
    const fn index(self) -> usize {
        self.row * COLS + self.col
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A plain numbered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Tile identifier.
    pub id: TileId,
    /// Face value.
    pub value: u32,
}

impl Tile {
    /// Create a new tile.
    #[must_use]
    pub const fn new(id: TileId, value: u32) -> Self {
        Self { id, value }
    }
}

/// Contents of a single grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cell {
    /// Nothing here.
    #[default]
    Empty,
    /// A plain numbered tile.
    Number(Tile),
    /// A special tile carrying its own state.
    Special(SpecialTile),
}

impl Cell {
    /// Check if the cell is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Check if the cell holds anything.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        !self.is_empty()
    }

    /// Identifier of the occupant.
    #[must_use]
    pub const fn id(&self) -> Option<TileId> {
        match self {
            Cell::Empty => None,
            Cell::Number(tile) => Some(tile.id),
            Cell::Special(special) => Some(special.id),
        }
    }

    /// Value used by the merge rules. `None` for empty cells, steel and lead.
    #[must_use]
    pub const fn value(&self) -> Option<u32> {
        match self {
            Cell::Empty => None,
            Cell::Number(tile) => Some(tile.value),
            Cell::Special(special) => special.kind.value(),
        }
    }

    /// The special tile in this cell, if any.
    #[must_use]
    pub const fn special(&self) -> Option<&SpecialTile> {
        match self {
            Cell::Special(special) => Some(special),
            _ => None,
        }
    }

    /// Steel plates stay put under gravity and shifts.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(
            self,
            Cell::Special(SpecialTile {
                kind: SpecialKind::Steel { .. },
                ..
            })
        )
    }

    /// Steel and lead: never merge, never swap.
    #[must_use]
    pub const fn is_obstacle(&self) -> bool {
        matches!(
            self,
            Cell::Special(SpecialTile {
                kind: SpecialKind::Steel { .. } | SpecialKind::Lead { .. },
                ..
            })
        )
    }

    /// Check if the cell holds a bomb.
    #[must_use]
    pub const fn is_bomb(&self) -> bool {
        matches!(
            self,
            Cell::Special(SpecialTile {
                kind: SpecialKind::Bomb { .. },
                ..
            })
        )
    }
}

/// The playfield: `COLS` × `ROWS` cells in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_copy_implementations)]
pub struct Grid {
    /// Cells stored in row-major order.
    cells: [Cell; CELL_COUNT],
}

impl Grid {
    /// Create an empty grid.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELL_COUNT],
        }
    }

    /// Get the cell at a position. `None` if off the board.
    #[must_use]
    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        pos.in_bounds().then(|| &self.cells[pos.index()])
    }

    /// Check if the position is on the board and empty.
    #[must_use]
    pub fn is_empty_at(&self, pos: Pos) -> bool {
        self.get(pos).is_some_and(Cell::is_empty)
    }

    /// Get a mutable reference to the cell at a position.
    pub(crate) fn get_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        pos.in_bounds().then(|| &mut self.cells[pos.index()])
    }

    /// Set the cell at a position.
    ///
    /// Returns `false` if the position is off the board.
    pub(crate) fn set(&mut self, pos: Pos, cell: Cell) -> bool {
        match self.get_mut(pos) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Remove and return the occupant, leaving the cell empty.
    pub(crate) fn take(&mut self, pos: Pos) -> Cell {
        self.get_mut(pos).map(std::mem::take).unwrap_or_default()
    }

    /// Exchange the contents of two cells.
    ///
    /// Returns `false` (and does nothing) if either position is off the board.
    pub(crate) fn swap(&mut self, a: Pos, b: Pos) -> bool {
        if !a.in_bounds() || !b.in_bounds() {
            return false;
        }
        self.cells.swap(a.index(), b.index());
        true
    }

    /// Lowest empty row in a column, scanning from the bottom.
    #[must_use]
    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).rev().find(|&row| self.is_empty_at(Pos::new(col, row)))
    }

    /// Check if a column has no empty cell.
    #[must_use]
    pub fn is_column_full(&self, col: usize) -> bool {
        self.lowest_empty_row(col).is_none()
    }

    /// Check if every column is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Cell::is_occupied)
    }

    /// Number of stacked cells in a column, counted from the bottom up to the
    /// first gap.
    #[must_use]
    pub fn column_height(&self, col: usize) -> usize {
        (0..ROWS)
            .rev()
            .take_while(|&row| self.get(Pos::new(col, row)).is_some_and(Cell::is_occupied))
            .count()
    }

    /// Find the position of a tile by id.
    #[must_use]
    pub fn find(&self, id: TileId) -> Option<Pos> {
        self.iter()
            .find(|(_, cell)| cell.id() == Some(id))
            .map(|(pos, _)| pos)
    }

    /// Count cells whose merge value equals `value`.
    #[must_use]
    pub fn count_value(&self, value: u32) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.value() == Some(value))
            .count()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_occupied()).count()
    }

    /// Highest merge value on the board.
    #[must_use]
    pub fn max_value(&self) -> u32 {
        self.cells.iter().filter_map(Cell::value).max().unwrap_or(0)
    }

    /// Get a reference to the raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate over all positions and cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (Pos::new(idx % COLS, idx / COLS), cell))
    }

    /// Rows from top to bottom, each `COLS` wide.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(COLS).map(<[Cell]>::to_vec).collect()
    }

    /// Build a grid from rows listed top to bottom.
    ///
    /// Returns `None` unless there are exactly `ROWS` rows of `COLS` cells.
    #[must_use]
    pub fn from_rows(rows: &[Vec<Cell>]) -> Option<Self> {
        if rows.len() != ROWS || rows.iter().any(|row| row.len() != COLS) {
            return None;
        }
        let mut grid = Self::new();
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                grid.cells[Pos::new(col_idx, row_idx).index()] = *cell;
            }
        }
        Some(grid)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_offset_bounds() {
        assert_eq!(Pos::new(0, 0).left(), None);
        assert_eq!(Pos::new(0, 0).up(), None);
        assert_eq!(Pos::new(COLS - 1, 0).right(), None);
        assert_eq!(Pos::new(0, ROWS - 1).down(), None);
        assert_eq!(Pos::new(1, 1).down(), Some(Pos::new(1, 2)));
    }

    #[test]
    fn test_orthogonal_corner() {
        let (adj, count) = Pos::new(0, 0).orthogonal();
        let adj = &adj[..count as usize];
        assert_eq!(count, 2);
        assert!(adj.contains(&Pos::new(0, 1)));
        assert!(adj.contains(&Pos::new(1, 0)));
    }

    #[test]
    fn test_neighborhood_clipped() {
        let (cells, count) = Pos::new(0, ROWS - 1).neighborhood();
        assert_eq!(count, 4);
        assert_eq!(cells[0], Pos::new(0, ROWS - 1));

        let (_, count) = Pos::new(1, 2).neighborhood();
        assert_eq!(count, 9);
    }

    #[test]
    fn test_lowest_empty_row_scans_bottom_up() {
        let mut grid = Grid::new();
        assert_eq!(grid.lowest_empty_row(0), Some(ROWS - 1));

        grid.set(Pos::new(0, ROWS - 1), Cell::Number(Tile::new(1, 3)));
        assert_eq!(grid.lowest_empty_row(0), Some(ROWS - 2));
        assert_eq!(grid.lowest_empty_row(COLS), None);
    }

    #[test]
    fn test_take_and_find() {
        let mut grid = Grid::new();
        let pos = Pos::new(2, 4);
        grid.set(pos, Cell::Number(Tile::new(7, 6)));

        assert_eq!(grid.find(7), Some(pos));
        assert_eq!(grid.take(pos), Cell::Number(Tile::new(7, 6)));
        assert!(grid.is_empty_at(pos));
        assert_eq!(grid.find(7), None);
    }

    #[test]
    fn test_rows_roundtrip() {
        let mut grid = Grid::new();
        grid.set(Pos::new(3, 0), Cell::Number(Tile::new(1, 12)));
        let rebuilt = Grid::from_rows(&grid.rows()).unwrap();
        assert_eq!(rebuilt, grid);
        assert!(Grid::from_rows(&grid.rows()[1..]).is_none());
    }
}
