//! Special-tile policy: spawning, turn timers and glass damage.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::events::SpecialEvent;
use super::tile::{SpecialCollections, SpecialKind, SpecialTile, SpecialTileInfo};
use crate::board::{BoardEngine, COLS, Cell, Grid, Pos, is_valid_tile_value};

/// Starting counters for spawned special tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialConfig {
    /// Turns a steel plate stays.
    pub steel_turns: u32,
    /// Turns a lead tile stays.
    pub lead_countdown: u32,
    /// Cracks a glass tile survives.
    pub glass_durability: u32,
    /// Swaps an auto-swapper performs before settling.
    pub swapper_swaps: u32,
    /// Shortest delay between swaps.
    pub swapper_interval_min: u32,
    /// Longest delay between swaps.
    pub swapper_interval_max: u32,
    /// Merges a bomb absorbs before detonating.
    pub bomb_merges: u32,
}

impl Default for SpecialConfig {
    fn default() -> Self {
        Self {
            steel_turns: 5,
            lead_countdown: 8,
            glass_durability: 3,
            swapper_swaps: 3,
            swapper_interval_min: 2,
            swapper_interval_max: 4,
            bomb_merges: 2,
        }
    }
}

/// Running totals of special-tile outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialStats {
    /// Lead tiles that counted down and cleared.
    pub lead_cleared: u32,
    /// Steel plates that expired.
    pub steel_expired: u32,
    /// Glass tiles shattered by merges or blasts.
    pub glass_broken: u32,
    /// Bombs that detonated.
    pub bombs_detonated: u32,
    /// Auto-swaps performed.
    pub swaps_performed: u32,
}

impl SpecialStats {
    /// Add another game's totals to these.
    pub const fn merge(&mut self, other: &SpecialStats) {
        self.lead_cleared += other.lead_cleared;
        self.steel_expired += other.steel_expired;
        self.glass_broken += other.glass_broken;
        self.bombs_detonated += other.bombs_detonated;
        self.swaps_performed += other.swaps_performed;
    }
}

/// Applies special-tile rules to a board.
#[derive(Debug, Clone)]
pub struct SpecialTileEngine {
    config: SpecialConfig,
    pub(super) rng: SmallRng,
    pub(super) stats: SpecialStats,
}

impl SpecialTileEngine {
    /// Create an engine with the given counters and seed.
    #[must_use]
    pub fn new(config: SpecialConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            stats: SpecialStats::default(),
        }
    }

    /// Same as [`new`](Self::new) but continuing from saved totals.
    #[must_use]
    pub fn with_stats(config: SpecialConfig, seed: u64, stats: SpecialStats) -> Self {
        Self {
            stats,
            ..Self::new(config, seed)
        }
    }

    /// Restart the random stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Get the starting counters.
    #[must_use]
    pub const fn config(&self) -> &SpecialConfig {
        &self.config
    }

    /// Get the running totals.
    #[must_use]
    pub const fn stats(&self) -> &SpecialStats {
        &self.stats
    }

    /// Special tiles currently on the board, grouped by kind.
    #[must_use]
    pub fn collections(board: &BoardEngine) -> SpecialCollections {
        SpecialCollections::from_grid(board.grid())
    }

    /// Place a steel plate.
    pub fn spawn_steel_plate(
        &mut self,
        board: &mut BoardEngine,
        col: Option<usize>,
        row: Option<usize>,
    ) -> Option<SpecialTileInfo> {
        let kind = SpecialKind::Steel {
            turns_remaining: self.config.steel_turns.max(1),
        };
        self.spawn(board, col, row, kind)
    }

    /// Place a lead tile.
    pub fn spawn_lead_tile(
        &mut self,
        board: &mut BoardEngine,
        col: Option<usize>,
        row: Option<usize>,
    ) -> Option<SpecialTileInfo> {
        let kind = SpecialKind::Lead {
            countdown: self.config.lead_countdown.max(1),
        };
        self.spawn(board, col, row, kind)
    }

    /// Place a glass tile. Without a value, 1, 2 or 3 is picked at random.
    pub fn spawn_glass_tile(
        &mut self,
        board: &mut BoardEngine,
        col: Option<usize>,
        row: Option<usize>,
        value: Option<u32>,
    ) -> Option<SpecialTileInfo> {
        let value = self.spawn_value(value)?;
        let kind = SpecialKind::Glass {
            value,
            durability: self.config.glass_durability.max(1),
        };
        self.spawn(board, col, row, kind)
    }

    /// Place an auto-swapper. Without a value, 1, 2 or 3 is picked at random.
    pub fn spawn_auto_swapper(
        &mut self,
        board: &mut BoardEngine,
        col: Option<usize>,
        row: Option<usize>,
        value: Option<u32>,
    ) -> Option<SpecialTileInfo> {
        let value = self.spawn_value(value)?;
        let kind = SpecialKind::AutoSwapper {
            value,
            swaps_remaining: self.config.swapper_swaps.max(1),
            next_swap_in: self.swap_interval(),
        };
        self.spawn(board, col, row, kind)
    }

    /// Place a bomb. Without a value, 1, 2 or 3 is picked at random.
    pub fn spawn_bomb(
        &mut self,
        board: &mut BoardEngine,
        col: Option<usize>,
        row: Option<usize>,
        value: Option<u32>,
    ) -> Option<SpecialTileInfo> {
        let value = self.spawn_value(value)?;
        let kind = SpecialKind::Bomb {
            value,
            merges_remaining: self.config.bomb_merges.max(1),
        };
        self.spawn(board, col, row, kind)
    }

    fn spawn_value(&mut self, value: Option<u32>) -> Option<u32> {
        match value {
            Some(value) if is_valid_tile_value(value) => Some(value),
            Some(value) => {
                warn!(value, "refusing to spawn special tile with invalid value");
                None
            }
            None => Some(self.rng.gen_range(1..=3)),
        }
    }

    /// Random delay until an auto-swapper's next swap.
    pub(super) fn swap_interval(&mut self) -> u32 {
        let min = self.config.swapper_interval_min.max(1);
        let max = self.config.swapper_interval_max.max(min);
        self.rng.gen_range(min..=max)
    }

    fn spawn(
        &mut self,
        board: &mut BoardEngine,
        col: Option<usize>,
        row: Option<usize>,
        kind: SpecialKind,
    ) -> Option<SpecialTileInfo> {
        let pos = self.spawn_position(board.grid(), col, row)?;
        let id = board.issue_tile_id();
        board
            .grid_mut()
            .set(pos, Cell::Special(SpecialTile::new(id, kind)));
        debug!(id, %pos, kind = kind.special_type().as_str(), "special tile spawned");
        Some(SpecialTileInfo { id, pos, kind })
    }

    /// Resolve where a spawn lands.
    ///
    /// Both coordinates: that cell, if empty. Column only: its lowest empty
    /// row. Row only: a random column with that row empty. Neither: a random
    /// non-full column at its lowest empty row.
    fn spawn_position(
        &mut self,
        grid: &Grid,
        col: Option<usize>,
        row: Option<usize>,
    ) -> Option<Pos> {
        match (col, row) {
            (Some(col), Some(row)) => {
                let pos = Pos::new(col, row);
                grid.is_empty_at(pos).then_some(pos)
            }
            (Some(col), None) => grid.lowest_empty_row(col).map(|row| Pos::new(col, row)),
            (None, Some(row)) => {
                let candidates: Vec<Pos> = (0..COLS)
                    .map(|col| Pos::new(col, row))
                    .filter(|&pos| grid.is_empty_at(pos))
                    .collect();
                candidates.choose(&mut self.rng).copied()
            }
            (None, None) => {
                let candidates: Vec<Pos> = (0..COLS)
                    .filter_map(|col| grid.lowest_empty_row(col).map(|row| Pos::new(col, row)))
                    .collect();
                candidates.choose(&mut self.rng).copied()
            }
        }
    }

    /// Advance every special tile's turn timer.
    ///
    /// Steel first, then lead, then auto-swappers.
    pub fn update_special_tiles(&mut self, board: &mut BoardEngine) -> Vec<SpecialEvent> {
        let mut events = Vec::new();
        let collections = SpecialCollections::from_grid(board.grid());

        for steel in &collections.steel {
            let SpecialKind::Steel { turns_remaining } = steel.kind else {
                continue;
            };
            let turns_remaining = turns_remaining.saturating_sub(1);
            if turns_remaining == 0 {
                board.grid_mut().take(steel.pos);
                self.stats.steel_expired += 1;
                events.push(SpecialEvent::SteelRemoved {
                    id: steel.id,
                    pos: steel.pos,
                });
            } else {
                set_kind(board, steel.pos, SpecialKind::Steel { turns_remaining });
                events.push(SpecialEvent::SteelTick {
                    id: steel.id,
                    pos: steel.pos,
                    turns_remaining,
                });
            }
        }

        for lead in &collections.lead {
            let SpecialKind::Lead { countdown } = lead.kind else {
                continue;
            };
            let countdown = countdown.saturating_sub(1);
            if countdown == 0 {
                board.grid_mut().take(lead.pos);
                self.stats.lead_cleared += 1;
                events.push(SpecialEvent::LeadRemoved {
                    id: lead.id,
                    pos: lead.pos,
                });
            } else {
                set_kind(board, lead.pos, SpecialKind::Lead { countdown });
                events.push(SpecialEvent::LeadDecremented {
                    id: lead.id,
                    pos: lead.pos,
                    countdown,
                });
            }
        }

        let swapper_ids: Vec<_> = collections.swappers.iter().map(|info| info.id).collect();
        for id in swapper_ids {
            self.tick_swapper(board, id, &mut events);
        }

        events
    }

    /// Crack every glass tile orthogonally adjacent to a merge at `pos`.
    pub fn on_merge(&mut self, board: &mut BoardEngine, pos: Pos) -> Vec<SpecialEvent> {
        let mut events = Vec::new();
        let (neighbours, count) = pos.orthogonal();
        for &neighbour in &neighbours[..count as usize] {
            let Some(&Cell::Special(special)) = board.grid().get(neighbour) else {
                continue;
            };
            let SpecialKind::Glass { value, durability } = special.kind else {
                continue;
            };
            let durability = durability.saturating_sub(1);
            if durability == 0 {
                board.grid_mut().take(neighbour);
                self.stats.glass_broken += 1;
                events.push(SpecialEvent::GlassBroken {
                    id: special.id,
                    pos: neighbour,
                    value,
                });
            } else {
                set_kind(board, neighbour, SpecialKind::Glass { value, durability });
                events.push(SpecialEvent::GlassCracked {
                    id: special.id,
                    pos: neighbour,
                    durability,
                });
            }
        }
        events
    }
}

/// Replace the state of the special tile at `pos`, keeping its id.
pub(super) fn set_kind(board: &mut BoardEngine, pos: Pos, kind: SpecialKind) {
    if let Some(Cell::Special(special)) = board.grid_mut().get_mut(pos) {
        special.kind = kind;
    }
}
