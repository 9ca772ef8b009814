//! Bomb merges and detonation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::{SpecialTileEngine, set_kind};
use super::tile::SpecialKind;
use crate::board::{BoardEngine, Cell, Pos, TileId};

/// What a blast did to one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlastEffect {
    /// The exploding bomb itself.
    Detonated,
    /// A plain tile or auto-swapper, removed.
    Destroyed,
    /// A glass tile, shattered.
    Shattered,
    /// Another bomb, left in place for the caller to detonate.
    ChainReaction,
}

/// A tile caught in a blast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedTile {
    /// Tile id.
    pub id: TileId,
    /// Position.
    pub pos: Pos,
    /// Value of the tile.
    pub value: u32,
    /// What happened to it.
    pub effect: BlastEffect,
}

/// Outcome of a bomb merge or detonation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionResult {
    /// Position of the bomb.
    pub center: Pos,
    /// Whether the bomb went off.
    pub detonated: bool,
    /// Merges the bomb can still absorb. Zero once detonated.
    pub merges_remaining: u32,
    /// Points scored by the blast.
    pub points: u64,
    /// Tiles caught in the blast, the bomb itself first.
    pub affected: Vec<AffectedTile>,
}

impl ExplosionResult {
    fn inert(center: Pos, merges_remaining: u32) -> Self {
        Self {
            center,
            detonated: false,
            merges_remaining,
            points: 0,
            affected: Vec::new(),
        }
    }

    /// Positions of bombs this blast set off but did not detonate.
    pub fn chain_reactions(&self) -> impl Iterator<Item = Pos> + '_ {
        self.affected
            .iter()
            .filter(|tile| tile.effect == BlastEffect::ChainReaction)
            .map(|tile| tile.pos)
    }
}

impl SpecialTileEngine {
    /// Count a merge against the bomb at `pos`, detonating it when its merges
    /// run out.
    ///
    /// Does nothing if `pos` holds no bomb. The bomb keeps the larger of its
    /// current value and `new_value`.
    pub fn on_bomb_merge(
        &mut self,
        board: &mut BoardEngine,
        pos: Pos,
        new_value: u32,
    ) -> ExplosionResult {
        let Some(SpecialKind::Bomb {
            value,
            merges_remaining,
        }) = board.grid().get(pos).and_then(Cell::special).map(|s| s.kind)
        else {
            return ExplosionResult::inert(pos, 0);
        };

        let merges_remaining = merges_remaining.saturating_sub(1);
        set_kind(
            board,
            pos,
            SpecialKind::Bomb {
                value: value.max(new_value),
                merges_remaining,
            },
        );
        if merges_remaining == 0 {
            return self.detonate_bomb(board, pos);
        }
        debug!(%pos, merges_remaining, "bomb primed");
        ExplosionResult::inert(pos, merges_remaining)
    }

    /// Two bombs merged: remove the one at `first` if it is still there and
    /// detonate the one at `second` at once.
    pub fn on_bomb_bomb_merge(
        &mut self,
        board: &mut BoardEngine,
        first: Pos,
        second: Pos,
    ) -> ExplosionResult {
        if first != second && board.grid().get(first).is_some_and(Cell::is_bomb) {
            board.grid_mut().take(first);
        }
        self.detonate_bomb(board, second)
    }

    /// Blow up the bomb at `center`, clearing its 3×3 neighbourhood.
    ///
    /// Steel and lead are immune. Other bombs are reported as chain
    /// reactions and left in place. Everything else is removed and its value
    /// is added to the score. A `center` without a bomb changes nothing.
    pub fn detonate_bomb(&mut self, board: &mut BoardEngine, center: Pos) -> ExplosionResult {
        if !board.grid().get(center).is_some_and(Cell::is_bomb) {
            return ExplosionResult::inert(center, 0);
        }

        let mut affected = Vec::new();
        let mut points = 0u64;
        let (cells, count) = center.neighborhood();
        for &pos in &cells[..count as usize] {
            let Some(&cell) = board.grid().get(pos) else {
                continue;
            };
            let (Some(id), Some(value)) = (cell.id(), cell.value()) else {
                continue;
            };

            let effect = if pos == center {
                BlastEffect::Detonated
            } else {
                match cell.special().map(|s| s.kind) {
                    Some(SpecialKind::Bomb { .. }) => BlastEffect::ChainReaction,
                    Some(SpecialKind::Glass { .. }) => BlastEffect::Shattered,
                    _ => BlastEffect::Destroyed,
                }
            };

            if effect != BlastEffect::ChainReaction {
                board.grid_mut().take(pos);
                points += u64::from(value);
            }
            if effect == BlastEffect::Shattered {
                self.stats.glass_broken += 1;
            }
            affected.push(AffectedTile {
                id,
                pos,
                value,
                effect,
            });
        }

        board.add_score(points);
        self.stats.bombs_detonated += 1;
        debug!(%center, points, affected = affected.len(), "bomb detonated");
        ExplosionResult {
            center,
            detonated: true,
            merges_remaining: 0,
            points,
            affected,
        }
    }
}
