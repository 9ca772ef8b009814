//! Special tile kinds and derived collections.

use serde::{Deserialize, Serialize};

use crate::board::{Cell, Grid, Pos, TileId};

/// Discriminant of a special tile kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialType {
    /// Immovable blocker.
    Steel,
    /// Falling blocker that counts down.
    Lead,
    /// Mergeable tile that cracks next to merges.
    Glass,
    /// Mergeable tile that wanders sideways and down.
    AutoSwapper,
    /// Mergeable tile that explodes after enough merges.
    Bomb,
}

impl SpecialType {
    /// All special types in turn-processing order.
    pub const ALL: [SpecialType; 5] = [
        SpecialType::Steel,
        SpecialType::Lead,
        SpecialType::Glass,
        SpecialType::AutoSwapper,
        SpecialType::Bomb,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SpecialType::Steel => "steel",
            SpecialType::Lead => "lead",
            SpecialType::Glass => "glass",
            SpecialType::AutoSwapper => "auto_swapper",
            SpecialType::Bomb => "bomb",
        }
    }
}

/// Per-kind state of a special tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// Blocks its cell; removed when the countdown ends.
    Steel {
        /// Turns until removal.
        turns_remaining: u32,
    },
    /// Falls with gravity, never merges; removed when the countdown ends.
    Lead {
        /// Turns until removal.
        countdown: u32,
    },
    /// Mergeable; cracks whenever a neighbouring merge resolves.
    Glass {
        /// Face value.
        value: u32,
        /// Cracks left before shattering.
        durability: u32,
    },
    /// Mergeable; periodically swaps with a neighbour.
    AutoSwapper {
        /// Face value.
        value: u32,
        /// Swaps left before becoming a plain tile.
        swaps_remaining: u32,
        /// Turns until the next swap attempt.
        next_swap_in: u32,
    },
    /// Mergeable; detonates once its merges run out.
    Bomb {
        /// Face value.
        value: u32,
        /// Merges left before detonation.
        merges_remaining: u32,
    },
}

impl SpecialKind {
    /// Value used by the merge rules. Steel and lead have none.
    #[must_use]
    pub const fn value(&self) -> Option<u32> {
        match self {
            SpecialKind::Steel { .. } | SpecialKind::Lead { .. } => None,
            SpecialKind::Glass { value, .. }
            | SpecialKind::AutoSwapper { value, .. }
            | SpecialKind::Bomb { value, .. } => Some(*value),
        }
    }

    /// Discriminant of this kind.
    #[must_use]
    pub const fn special_type(&self) -> SpecialType {
        match self {
            SpecialKind::Steel { .. } => SpecialType::Steel,
            SpecialKind::Lead { .. } => SpecialType::Lead,
            SpecialKind::Glass { .. } => SpecialType::Glass,
            SpecialKind::AutoSwapper { .. } => SpecialType::AutoSwapper,
            SpecialKind::Bomb { .. } => SpecialType::Bomb,
        }
    }

    /// Copy of this kind with a new face value. Steel and lead are unchanged.
    #[must_use]
    pub const fn with_value(self, new_value: u32) -> Self {
        match self {
            SpecialKind::Glass { durability, .. } => SpecialKind::Glass {
                value: new_value,
                durability,
            },
            SpecialKind::AutoSwapper {
                swaps_remaining,
                next_swap_in,
                ..
            } => SpecialKind::AutoSwapper {
                value: new_value,
                swaps_remaining,
                next_swap_in,
            },
            SpecialKind::Bomb {
                merges_remaining, ..
            } => SpecialKind::Bomb {
                value: new_value,
                merges_remaining,
            },
            other => other,
        }
    }

    /// The counter that ends this tile's life (turns, countdown, durability,
    /// swaps or merges).
    #[must_use]
    pub const fn life(&self) -> u32 {
        match self {
            SpecialKind::Steel { turns_remaining } => *turns_remaining,
            SpecialKind::Lead { countdown } => *countdown,
            SpecialKind::Glass { durability, .. } => *durability,
            SpecialKind::AutoSwapper {
                swaps_remaining, ..
            } => *swaps_remaining,
            SpecialKind::Bomb {
                merges_remaining, ..
            } => *merges_remaining,
        }
    }
}

/// A special tile as stored in a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTile {
    /// Tile identifier.
    pub id: TileId,
    /// Kind and per-kind state.
    pub kind: SpecialKind,
}

impl SpecialTile {
    /// Create a new special tile.
    #[must_use]
    pub const fn new(id: TileId, kind: SpecialKind) -> Self {
        Self { id, kind }
    }

    /// Check if this is a bomb.
    #[must_use]
    pub const fn is_bomb(&self) -> bool {
        matches!(self.kind, SpecialKind::Bomb { .. })
    }

    /// Same tile carrying a new face value.
    #[must_use]
    pub const fn with_value(self, value: u32) -> Self {
        Self::new(self.id, self.kind.with_value(value))
    }
}

/// Descriptor of a special tile and where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTileInfo {
    /// Tile identifier.
    pub id: TileId,
    /// Current position.
    pub pos: Pos,
    /// Kind and per-kind state.
    pub kind: SpecialKind,
}

/// Special tiles on a grid, grouped by kind.
///
/// The grid cells are the source of truth; this is a view computed from them,
/// so a tile's record always sits at the cell it occupies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialCollections {
    /// Steel plates.
    pub steel: Vec<SpecialTileInfo>,
    /// Lead tiles.
    pub lead: Vec<SpecialTileInfo>,
    /// Glass tiles.
    pub glass: Vec<SpecialTileInfo>,
    /// Auto-swappers.
    pub swappers: Vec<SpecialTileInfo>,
    /// Bombs.
    pub bombs: Vec<SpecialTileInfo>,
}

impl SpecialCollections {
    /// Collect every special tile on the grid, in row-major order.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let mut collections = Self::default();
        for (pos, cell) in grid.iter() {
            if let Cell::Special(special) = cell {
                let info = SpecialTileInfo {
                    id: special.id,
                    pos,
                    kind: special.kind,
                };
                collections.of_type_mut(special.kind.special_type()).push(info);
            }
        }
        collections
    }

    /// Entries of one kind.
    #[must_use]
    pub fn of_type(&self, special_type: SpecialType) -> &[SpecialTileInfo] {
        match special_type {
            SpecialType::Steel => &self.steel,
            SpecialType::Lead => &self.lead,
            SpecialType::Glass => &self.glass,
            SpecialType::AutoSwapper => &self.swappers,
            SpecialType::Bomb => &self.bombs,
        }
    }

    fn of_type_mut(&mut self, special_type: SpecialType) -> &mut Vec<SpecialTileInfo> {
        match special_type {
            SpecialType::Steel => &mut self.steel,
            SpecialType::Lead => &mut self.lead,
            SpecialType::Glass => &mut self.glass,
            SpecialType::AutoSwapper => &mut self.swappers,
            SpecialType::Bomb => &mut self.bombs,
        }
    }

    /// Iterate over every entry of every kind.
    pub fn iter(&self) -> impl Iterator<Item = &SpecialTileInfo> {
        SpecialType::ALL
            .into_iter()
            .flat_map(move |special_type| self.of_type(special_type).iter())
    }

    /// Total number of special tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        SpecialType::ALL
            .iter()
            .map(|&special_type| self.of_type(special_type).len())
            .sum()
    }

    /// Check if there are no special tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Tile;

    #[test]
    fn test_kind_values() {
        assert_eq!(SpecialKind::Steel { turns_remaining: 3 }.value(), None);
        assert_eq!(SpecialKind::Lead { countdown: 3 }.value(), None);
        assert_eq!(
            SpecialKind::Glass {
                value: 6,
                durability: 2
            }
            .value(),
            Some(6)
        );
    }

    #[test]
    fn test_with_value_keeps_counters() {
        let bomb = SpecialKind::Bomb {
            value: 3,
            merges_remaining: 2,
        };
        assert_eq!(
            bomb.with_value(6),
            SpecialKind::Bomb {
                value: 6,
                merges_remaining: 2
            }
        );
        let steel = SpecialKind::Steel { turns_remaining: 4 };
        assert_eq!(steel.with_value(6), steel);
    }

    #[test]
    fn test_collections_follow_grid() {
        let mut grid = Grid::new();
        grid.set(
            Pos::new(1, 5),
            Cell::Special(SpecialTile::new(4, SpecialKind::Lead { countdown: 2 })),
        );
        grid.set(Pos::new(2, 5), Cell::Number(Tile::new(5, 3)));
        grid.set(
            Pos::new(3, 5),
            Cell::Special(SpecialTile::new(
                6,
                SpecialKind::Bomb {
                    value: 3,
                    merges_remaining: 1,
                },
            )),
        );

        let collections = SpecialCollections::from_grid(&grid);
        assert_eq!(collections.len(), 2);
        assert_eq!(collections.lead[0].pos, Pos::new(1, 5));
        assert_eq!(collections.bombs[0].id, 6);

        grid.swap(Pos::new(1, 5), Pos::new(0, 5));
        let moved = SpecialCollections::from_grid(&grid);
        assert_eq!(moved.lead[0].pos, Pos::new(0, 5));
    }
}
