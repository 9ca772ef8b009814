//! Events reported by special-tile updates.

use serde::{Deserialize, Serialize};

use crate::board::{Pos, TileId};

/// Something that happened to a special tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecialEvent {
    /// A steel plate counted down.
    SteelTick {
        /// Steel id.
        id: TileId,
        /// Position.
        pos: Pos,
        /// Turns left.
        turns_remaining: u32,
    },
    /// A steel plate expired.
    SteelRemoved {
        /// Steel id.
        id: TileId,
        /// Position it left.
        pos: Pos,
    },
    /// A lead tile counted down.
    LeadDecremented {
        /// Lead id.
        id: TileId,
        /// Position.
        pos: Pos,
        /// Turns left.
        countdown: u32,
    },
    /// A lead tile cleared.
    LeadRemoved {
        /// Lead id.
        id: TileId,
        /// Position it left.
        pos: Pos,
    },
    /// An auto-swapper traded places with a neighbour.
    AutoSwap {
        /// Swapper id.
        id: TileId,
        /// Where the swapper was.
        from: Pos,
        /// Where the swapper is now.
        to: Pos,
        /// Tile moved into `from`, if the neighbour was occupied.
        displaced: Option<TileId>,
        /// Swaps left.
        swaps_remaining: u32,
    },
    /// An auto-swapper's timer advanced without a swap.
    SwapperTick {
        /// Swapper id.
        id: TileId,
        /// Position.
        pos: Pos,
        /// Turns until the next attempt.
        next_swap_in: u32,
    },
    /// An auto-swapper ran out of swaps and became a plain tile.
    SwapperExpired {
        /// Tile id, kept by the plain tile.
        id: TileId,
        /// Position.
        pos: Pos,
        /// Value of the plain tile.
        value: u32,
    },
    /// A glass tile cracked next to a merge.
    GlassCracked {
        /// Glass id.
        id: TileId,
        /// Position.
        pos: Pos,
        /// Cracks left.
        durability: u32,
    },
    /// A glass tile shattered.
    GlassBroken {
        /// Glass id.
        id: TileId,
        /// Position it left.
        pos: Pos,
        /// Value it carried.
        value: u32,
    },
}

impl SpecialEvent {
    /// Id of the tile the event concerns.
    #[must_use]
    pub const fn id(&self) -> TileId {
        match self {
            SpecialEvent::SteelTick { id, .. }
            | SpecialEvent::SteelRemoved { id, .. }
            | SpecialEvent::LeadDecremented { id, .. }
            | SpecialEvent::LeadRemoved { id, .. }
            | SpecialEvent::AutoSwap { id, .. }
            | SpecialEvent::SwapperTick { id, .. }
            | SpecialEvent::SwapperExpired { id, .. }
            | SpecialEvent::GlassCracked { id, .. }
            | SpecialEvent::GlassBroken { id, .. } => *id,
        }
    }

    /// Check if the event removed a tile from the board.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        matches!(
            self,
            SpecialEvent::SteelRemoved { .. }
                | SpecialEvent::LeadRemoved { .. }
                | SpecialEvent::GlassBroken { .. }
        )
    }
}
