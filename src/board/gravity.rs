//! Gravity with cascading merges.

use std::collections::HashMap;

use tracing::trace;

use super::engine::{BoardEngine, MergeKind, Operation};
use super::grid::{COLS, Cell, Pos, ROWS, TileId};
use crate::special::SpecialKind;

impl BoardEngine {
    /// Let every unsupported tile fall, merging on landing where possible.
    ///
    /// Columns are scanned bottom to top, repeatedly, until a full scan moves
    /// nothing. Steel stays where it is. A falling tile that lands on a
    /// compatible tile merges into that lower cell.
    ///
    /// A bomb takes at most as many fall-merges per call as it has merges
    /// remaining, and none after a bomb-on-bomb merge. Tiles beyond that
    /// land on top of it.
    pub fn apply_gravity(&mut self) -> Vec<Operation> {
        let mut operations = Vec::new();
        let mut absorbed = HashMap::new();
        loop {
            let mut moved = false;
            for col in 0..COLS {
                for row in (0..ROWS - 1).rev() {
                    if let Some(op) = self.fall_one(Pos::new(col, row), &mut absorbed) {
                        operations.push(op);
                        moved = true;
                    }
                }
            }
            if !moved {
                break;
            }
        }
        if !operations.is_empty() {
            trace!(count = operations.len(), "gravity settled");
        }
        operations
    }

    fn fall_one(&mut self, pos: Pos, absorbed: &mut HashMap<TileId, u32>) -> Option<Operation> {
        let cell = *self.grid().get(pos)?;
        if cell.is_empty() || cell.is_fixed() {
            return None;
        }
        let mut rest = pos.down().filter(|&below| self.grid().is_empty_at(below))?;
        while let Some(next) = rest.down().filter(|&below| self.grid().is_empty_at(below)) {
            rest = next;
        }

        let id = cell.id()?;
        let moving = self.grid_mut().take(pos);
        if let Some(landing) = rest.down()
            && !self.bomb_spent(moving, landing, absorbed)
            && let Some((value, merge)) = self.combine(moving, landing)
        {
            if let Some(bomb) = self.grid().get(landing).and_then(Cell::id) {
                match merge {
                    MergeKind::Plain => {}
                    MergeKind::Bomb => *absorbed.entry(bomb).or_insert(0) += 1,
                    MergeKind::BombPair => {
                        absorbed.insert(bomb, u32::MAX);
                    }
                }
            }
            return Some(Operation::FallMerge {
                id,
                col: pos.col,
                from_row: pos.row,
                to_row: landing.row,
                value,
                merge,
            });
        }

        self.grid_mut().set(rest, moving);
        Some(Operation::Fall {
            id,
            col: pos.col,
            from_row: pos.row,
            to_row: rest.row,
            value: moving.value(),
        })
    }

    /// Check if the bomb a merge at `landing` would feed has no merges left
    /// to give in this gravity call.
    fn bomb_spent(&self, moving: Cell, landing: Pos, absorbed: &HashMap<TileId, u32>) -> bool {
        let Some(&stationary) = self.grid().get(landing) else {
            return false;
        };
        let bomb = if stationary.is_bomb() {
            stationary
        } else if moving.is_bomb() {
            moving
        } else {
            return false;
        };
        match (bomb.id(), bomb.special().map(|s| s.kind)) {
            (Some(id), Some(SpecialKind::Bomb { merges_remaining, .. })) => {
                absorbed.get(&id).copied().unwrap_or(0) >= merges_remaining
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{BoardEngine, Cell, Grid, MergeKind, Operation, Pos, ROWS, Tile};
    use crate::special::{SpecialKind, SpecialTile};

    fn number(id: u64, value: u32) -> Cell {
        Cell::Number(Tile::new(id, value))
    }

    #[test]
    fn test_floating_tile_falls_to_bottom() {
        let mut grid = Grid::new();
        grid.set(Pos::new(1, 0), number(1, 3));
        let mut board = BoardEngine::from_grid(grid);

        let ops = board.apply_gravity();
        assert_eq!(
            ops,
            vec![Operation::Fall {
                id: 1,
                col: 1,
                from_row: 0,
                to_row: ROWS - 1,
                value: Some(3),
            }]
        );
        assert!(board.apply_gravity().is_empty());
    }

    #[test]
    fn test_fall_merge_reports_lower_cell() {
        let mut grid = Grid::new();
        grid.set(Pos::new(0, ROWS - 1), number(1, 6));
        grid.set(Pos::new(0, 1), number(2, 6));
        let mut board = BoardEngine::from_grid(grid);

        let ops = board.apply_gravity();
        assert_eq!(ops.len(), 1);
        let site = ops[0].merge_site().unwrap();
        assert_eq!(site.at, Pos::new(0, ROWS - 1));
        assert_eq!(site.value, 12);
        assert_eq!(site.kind, MergeKind::Plain);
        assert_eq!(board.grid().occupied(), 1);
    }

    #[test]
    fn test_cascade_in_one_call() {
        // Column 0, bottom to top: 12, gap, 6, 6 stacked above the gap.
        let mut grid = Grid::new();
        grid.set(Pos::new(0, ROWS - 1), number(1, 12));
        grid.set(Pos::new(0, ROWS - 3), number(2, 6));
        grid.set(Pos::new(0, ROWS - 4), number(3, 6));
        let mut board = BoardEngine::from_grid(grid);

        board.apply_gravity();
        // 6 falls onto 12 (no merge), then the other 6 lands on it and merges,
        // and that 12 is now stacked on the 12 without falling.
        assert_eq!(board.grid().get(Pos::new(0, ROWS - 1)).unwrap().value(), Some(12));
        assert_eq!(board.grid().get(Pos::new(0, ROWS - 2)).unwrap().value(), Some(12));
        assert!(board.grid().is_empty_at(Pos::new(0, ROWS - 3)));
        assert!(board.apply_gravity().is_empty());
    }

    #[test]
    fn test_steel_holds_and_blocks() {
        let mut grid = Grid::new();
        grid.set(
            Pos::new(2, 2),
            Cell::Special(SpecialTile::new(
                1,
                SpecialKind::Steel {
                    turns_remaining: 3,
                },
            )),
        );
        grid.set(Pos::new(2, 0), number(2, 1));
        let mut board = BoardEngine::from_grid(grid);

        board.apply_gravity();
        assert!(board.grid().get(Pos::new(2, 2)).unwrap().is_fixed());
        assert_eq!(board.grid().find(2), Some(Pos::new(2, 1)));
    }

    #[test]
    fn test_bomb_takes_only_its_remaining_merges() {
        // Column 0, bottom to top: bomb(6, one merge left), gap, 6, 12.
        let mut grid = Grid::new();
        grid.set(
            Pos::new(0, ROWS - 1),
            Cell::Special(SpecialTile::new(
                1,
                SpecialKind::Bomb {
                    value: 6,
                    merges_remaining: 1,
                },
            )),
        );
        grid.set(Pos::new(0, ROWS - 3), number(2, 6));
        grid.set(Pos::new(0, ROWS - 4), number(3, 12));
        let mut board = BoardEngine::from_grid(grid);

        let ops = board.apply_gravity();
        let sites: Vec<_> = ops.iter().filter_map(Operation::merge_site).collect();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].kind, MergeKind::Bomb);
        assert_eq!(sites[0].value, 12);
        assert_eq!(board.grid().get(Pos::new(0, ROWS - 1)).unwrap().value(), Some(12));
        // The 12 stays a separate tile on top of the bomb.
        assert_eq!(board.grid().find(3), Some(Pos::new(0, ROWS - 2)));
        assert!(board.apply_gravity().is_empty());
    }

    #[test]
    fn test_lead_falls_without_merging() {
        let mut grid = Grid::new();
        grid.set(Pos::new(3, ROWS - 1), number(1, 3));
        grid.set(
            Pos::new(3, 0),
            Cell::Special(SpecialTile::new(2, SpecialKind::Lead { countdown: 4 })),
        );
        let mut board = BoardEngine::from_grid(grid);

        let ops = board.apply_gravity();
        assert!(matches!(ops[0], Operation::Fall { value: None, .. }));
        assert_eq!(board.grid().find(2), Some(Pos::new(3, ROWS - 2)));
    }
}
