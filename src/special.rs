//! Special tiles: steel, lead, glass, auto-swappers and bombs.
//!
//! Special tile state lives in the grid cells. [`SpecialTileEngine`] holds
//! the spawning policy, the random stream for swappers and the running
//! statistics, and applies per-turn and per-merge effects to a
//! [`BoardEngine`](crate::board::BoardEngine).

mod bomb;
mod engine;
mod events;
mod swapper;
mod tile;

pub use bomb::{AffectedTile, BlastEffect, ExplosionResult};
pub use engine::{SpecialConfig, SpecialStats, SpecialTileEngine};
pub use events::SpecialEvent;
pub use tile::{SpecialCollections, SpecialKind, SpecialTile, SpecialTileInfo, SpecialType};
