// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Mergedrop: a deterministic engine for a column-drop merging puzzle.
//!
//! Tiles fall into a 4×6 grid. A 1 and a 2 merge into 3; equal values from 3
//! up merge into their double. Special tiles (steel plates, lead, glass,
//! auto-swappers and bombs) complicate the board in hazard mode.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Snapshot / Autoplay / CLI         │
//! ├─────────────────────────────────────┤
//! │   Game session (turns, power-ups)   │
//! ├─────────────────────────────────────┤
//! │   SpecialTileEngine   │ TileGenerator│
//! ├─────────────────────────────────────┤
//! │   BoardEngine (grid, merge, gravity)│
//! └─────────────────────────────────────┘
//! ```
//!
//! Every random draw comes from a seeded stream, so a seed and a sequence of
//! actions always produce the same game.

pub mod board;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod special;

pub use error::{EngineError, EngineResult};

// Re-export key types at crate root for convenience
pub use board::{BoardEngine, Cell, DropValue, Grid, Pos, Tile, TileGenerator, TileId};
pub use session::{Game, GameConfig, GameError, GameMode, SessionResult, TurnReport};
pub use snapshot::{GameSnapshot, SnapshotError, render_ascii};
pub use special::{SpecialKind, SpecialTileEngine, SpecialType};
