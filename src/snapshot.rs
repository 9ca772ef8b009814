//! Saving and restoring games.
//!
//! A [`GameSnapshot`] carries every piece of persisted state: the grid,
//! board counters, the special collections, special stats, the queued value,
//! coins, the frenzy window and the config. Random streams are not stored;
//! they are re-derived from `config.seed` and `moves_used` on restore, so a
//! restored game continues exactly as the original would have.

mod render;

pub use render::render_ascii;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write as IoWrite};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{BoardEngine, Cell, DropValue, Grid, TileId, check_invariants};
use crate::session::{Game, GameConfig};
use crate::special::{SpecialCollections, SpecialStats, SpecialTileInfo};

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Grid rows from top to bottom.
    pub grid: Vec<Vec<Cell>>,
    /// Score so far.
    pub score: u64,
    /// Successful drops.
    pub moves_used: u32,
    /// Banked merges for the swap power-up.
    pub merge_count: u32,
    /// Merge histogram: resulting value to count.
    pub tiles_created: BTreeMap<u32, u32>,
    /// Id the next tile will get.
    pub next_tile_id: TileId,
    /// Special tiles with positions and counters.
    pub collections: SpecialCollections,
    /// Special-tile totals.
    pub stats: SpecialStats,
    /// Value queued for the next drop.
    pub next_value: DropValue,
    /// Coins held.
    pub coins: u32,
    /// Drops left in the frenzy window.
    pub frenzy_moves_left: u32,
    /// Game configuration, seed included.
    pub config: GameConfig,
}

/// Error type for snapshot operations.
#[derive(Debug)]
pub enum SnapshotError {
    /// Reading or writing the file failed.
    Io(io::Error),
    /// The file is not a valid snapshot document.
    Json(serde_json::Error),
    /// The grid does not have the board's dimensions.
    InvalidGrid {
        /// Rows found.
        rows: usize,
    },
    /// Saved state contradicts itself.
    Desync {
        /// What disagrees.
        message: String,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Snapshot I/O failed: {e}"),
            Self::Json(e) => write!(f, "Malformed snapshot: {e}"),
            Self::InvalidGrid { rows } => write!(f, "Invalid grid: {rows} rows of mismatched size"),
            Self::Desync { message } => write!(f, "Snapshot out of sync: {message}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

impl GameSnapshot {
    /// Write the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> SnapshotResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Read a snapshot written by [`GameSnapshot::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Sort a collection copy so comparisons ignore listing order.
fn sorted(collections: &SpecialCollections) -> Vec<SpecialTileInfo> {
    let mut tiles: Vec<SpecialTileInfo> = collections.iter().copied().collect();
    tiles.sort_by_key(|tile| tile.id);
    tiles
}

impl Game {
    /// Capture the persisted state.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let board = self.board();
        GameSnapshot {
            grid: board.grid().rows(),
            score: board.score(),
            moves_used: board.moves_used(),
            merge_count: board.merge_count(),
            tiles_created: board.tiles_created().clone(),
            next_tile_id: board.next_tile_id(),
            collections: self.collections(),
            stats: *self.specials().stats(),
            next_value: self.next_value(),
            coins: self.coins(),
            frenzy_moves_left: self.frenzy_moves_left(),
            config: self.config().clone(),
        }
    }

    /// Resume a game from a snapshot.
    ///
    /// # Errors
    ///
    /// `InvalidGrid` for wrong grid dimensions. `Desync` when the special
    /// collections disagree with the grid or the board breaks an invariant
    /// (duplicate ids, ids at or past `next_tile_id`, invalid values).
    pub fn restore(snapshot: GameSnapshot) -> SnapshotResult<Self> {
        let Some(grid) = Grid::from_rows(&snapshot.grid) else {
            warn!(rows = snapshot.grid.len(), "snapshot grid has wrong dimensions");
            return Err(SnapshotError::InvalidGrid {
                rows: snapshot.grid.len(),
            });
        };

        if sorted(&SpecialCollections::from_grid(&grid)) != sorted(&snapshot.collections) {
            warn!("snapshot collections disagree with grid");
            return Err(SnapshotError::Desync {
                message: "special collections disagree with the grid".to_string(),
            });
        }

        let board = BoardEngine::from_parts(
            grid,
            snapshot.score,
            snapshot.moves_used,
            snapshot.merge_count,
            snapshot.tiles_created,
            snapshot.next_tile_id,
        );
        if let Some(violation) = check_invariants(&board).into_iter().next() {
            warn!(%violation, "snapshot board breaks an invariant");
            return Err(SnapshotError::Desync {
                message: violation.message,
            });
        }

        debug!(
            seed = snapshot.config.seed,
            moves = snapshot.moves_used,
            "game restored"
        );
        Ok(Game::from_parts(
            snapshot.config,
            board,
            snapshot.stats,
            snapshot.next_value,
            snapshot.coins,
            snapshot.frenzy_moves_left,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{COLS, Pos, ROWS};
    use crate::session::{GameMode, Strategy, play_game};
    use crate::special::{SpecialKind, SpecialTile};

    fn hazard_config(seed: u64) -> GameConfig {
        GameConfig {
            seed,
            mode: GameMode::Hazards,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_save_load_restore() {
        let game = play_game(&hazard_config(77), 40, Strategy::Greedy);
        let snapshot = game.snapshot();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        snapshot.save(&path).unwrap();
        let loaded = GameSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);

        let restored = Game::restore(loaded).unwrap();
        assert_eq!(restored.board(), game.board());
        assert_eq!(restored.next_value(), game.next_value());
        assert_eq!(restored.coins(), game.coins());
        assert_eq!(restored.specials().stats(), game.specials().stats());
        assert_eq!(restored.collections(), game.collections());
    }

    #[test]
    fn test_restored_game_continues_identically() {
        let mut original = play_game(&hazard_config(5), 25, Strategy::Greedy);
        let mut restored = Game::restore(original.snapshot()).unwrap();

        for col in [0, 1, 2, 3, 0, 1] {
            let a = original.drop_tile(col);
            let b = restored.drop_tile(col);
            assert_eq!(a, b);
        }
        assert_eq!(original.snapshot(), restored.snapshot());
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let mut snapshot = Game::new(GameConfig::default()).snapshot();
        snapshot.grid.pop();
        assert!(matches!(
            Game::restore(snapshot),
            Err(SnapshotError::InvalidGrid { rows }) if rows == ROWS - 1
        ));

        let mut snapshot = Game::new(GameConfig::default()).snapshot();
        snapshot.grid[0].push(Cell::Empty);
        assert!(matches!(
            Game::restore(snapshot),
            Err(SnapshotError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_tampered_collection_is_desync() {
        let mut snapshot = Game::new(GameConfig::default()).snapshot();
        snapshot.collections.lead.push(SpecialTileInfo {
            id: 1,
            pos: Pos::new(0, ROWS - 1),
            kind: SpecialKind::Lead { countdown: 3 },
        });
        assert!(matches!(
            Game::restore(snapshot),
            Err(SnapshotError::Desync { .. })
        ));
    }

    #[test]
    fn test_id_past_next_tile_id_is_desync() {
        let mut snapshot = Game::new(GameConfig::default()).snapshot();
        let kind = SpecialKind::Glass {
            value: 3,
            durability: 2,
        };
        snapshot.grid[ROWS - 1][COLS - 1] = Cell::Special(SpecialTile::new(40, kind));
        snapshot.collections.glass.push(SpecialTileInfo {
            id: 40,
            pos: Pos::new(COLS - 1, ROWS - 1),
            kind,
        });
        assert!(matches!(
            Game::restore(snapshot),
            Err(SnapshotError::Desync { .. })
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            GameSnapshot::load(&path),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            GameSnapshot::load(&dir.path().join("missing.json")),
            Err(SnapshotError::Io(_))
        ));
    }
}
