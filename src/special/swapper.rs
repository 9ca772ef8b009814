//! Auto-swapper movement.

use rand::seq::SliceRandom;
use tracing::{debug, trace};

use super::engine::{SpecialTileEngine, set_kind};
use super::events::SpecialEvent;
use super::tile::SpecialKind;
use crate::board::{BoardEngine, Cell, Pos, Tile, TileId};
use crate::error::{EngineError, EngineResult};

impl SpecialTileEngine {
    /// Swap the auto-swapper at `pos` with a random neighbour to its left,
    /// right or below. Steel neighbours are never chosen.
    ///
    /// Returns the swapper's new position. Whatever occupied that cell,
    /// special or not, moves to `pos` with its state intact.
    ///
    /// # Errors
    ///
    /// `OutOfBounds`, `EmptyCell`, `Immovable` when `pos` holds anything but
    /// an auto-swapper, or `NoValidSwapTarget` when every candidate is off
    /// the board or steel. The board is untouched on error.
    pub fn perform_auto_swap(&mut self, board: &mut BoardEngine, pos: Pos) -> EngineResult<Pos> {
        let grid = board.grid();
        let cell = grid.get(pos).ok_or(EngineError::OutOfBounds { pos })?;
        if cell.is_empty() {
            return Err(EngineError::EmptyCell { pos });
        }
        if !matches!(
            cell.special().map(|s| s.kind),
            Some(SpecialKind::AutoSwapper { .. })
        ) {
            return Err(EngineError::Immovable { pos });
        }

        let candidates: Vec<Pos> = [pos.left(), pos.right(), pos.down()]
            .into_iter()
            .flatten()
            .filter(|&target| grid.get(target).is_some_and(|cell| !cell.is_fixed()))
            .collect();
        let target = *candidates
            .choose(&mut self.rng)
            .ok_or(EngineError::NoValidSwapTarget { pos })?;

        board.grid_mut().swap(pos, target);
        self.stats.swaps_performed += 1;
        debug!(from = %pos, to = %target, "auto swap");
        Ok(target)
    }

    /// Advance one auto-swapper's timer, swapping when it runs out.
    pub(super) fn tick_swapper(
        &mut self,
        board: &mut BoardEngine,
        id: TileId,
        events: &mut Vec<SpecialEvent>,
    ) {
        // An earlier swapper this turn may have displaced this one.
        let Some(pos) = board.grid().find(id) else {
            return;
        };
        let Some(&Cell::Special(special)) = board.grid().get(pos) else {
            return;
        };
        let SpecialKind::AutoSwapper {
            value,
            swaps_remaining,
            next_swap_in,
        } = special.kind
        else {
            return;
        };

        let next_swap_in = next_swap_in.saturating_sub(1);
        if next_swap_in > 0 {
            set_kind(
                board,
                pos,
                SpecialKind::AutoSwapper {
                    value,
                    swaps_remaining,
                    next_swap_in,
                },
            );
            events.push(SpecialEvent::SwapperTick {
                id,
                pos,
                next_swap_in,
            });
            return;
        }

        match self.perform_auto_swap(board, pos) {
            Ok(to) => {
                let displaced = board.grid().get(pos).and_then(Cell::id);
                let swaps_remaining = swaps_remaining.saturating_sub(1);
                events.push(SpecialEvent::AutoSwap {
                    id,
                    from: pos,
                    to,
                    displaced,
                    swaps_remaining,
                });
                if swaps_remaining == 0 {
                    board.grid_mut().set(to, Cell::Number(Tile::new(id, value)));
                    events.push(SpecialEvent::SwapperExpired { id, pos: to, value });
                } else {
                    let next_swap_in = self.swap_interval();
                    set_kind(
                        board,
                        to,
                        SpecialKind::AutoSwapper {
                            value,
                            swaps_remaining,
                            next_swap_in,
                        },
                    );
                }
            }
            Err(err) => {
                trace!(id, %err, "swapper stays put");
                let next_swap_in = self.swap_interval();
                set_kind(
                    board,
                    pos,
                    SpecialKind::AutoSwapper {
                        value,
                        swaps_remaining,
                        next_swap_in,
                    },
                );
                events.push(SpecialEvent::SwapperTick {
                    id,
                    pos,
                    next_swap_in,
                });
            }
        }
    }
}
