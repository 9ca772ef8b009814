//! Board layer for mergedrop.
//!
//! Implements the deterministic board rules:
//! - Grid of cells (empty, numbered tile, special tile)
//! - Merge rules (1+2=3, equal values from 3 up double)
//! - Drops, one-step shifts and gravity with cascading merges
//! - Weighted next-tile generation
//! - Invariant checks for tests and fuzzing

mod engine;
mod generator;
mod gravity;
mod grid;
mod invariants;
mod rules;
mod shift;

pub use engine::{BoardEngine, DropResult, MergeKind, MergeSite, Operation};
pub use generator::{GeneratorConfig, TileGenerator, ValueUnlock};
pub use grid::{COLS, Cell, Grid, Pos, ROWS, Tile, TileId};
pub use invariants::{
    InvariantViolation, SANITY_MAX_TILE_VALUE, assert_invariants, check_invariants, check_settled,
};
pub use rules::{DropValue, WILDCARD_FALLBACK, can_merge, is_valid_tile_value, merged_value};
pub use shift::{Direction, ShiftDirection};
