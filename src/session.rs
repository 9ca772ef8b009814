//! Game session: turn sequencing over the board and special-tile engines.
//!
//! A [`Game`] drives the engines the way a front end would. Each drop
//! resolves its merge side effects, settles gravity and chained detonations,
//! advances special-tile timers, spawns hazards and queues the next value.

mod autoplay;
mod powerups;

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{
    BoardEngine, DropResult, DropValue, GeneratorConfig, MergeKind, MergeSite, Operation,
    TileGenerator, TileId,
};
use crate::error::EngineError;
use crate::special::{
    BlastEffect, ExplosionResult, SpecialCollections, SpecialConfig, SpecialEvent, SpecialStats,
    SpecialTileEngine, SpecialTileInfo, SpecialType,
};

pub use autoplay::{Autoplayer, BatchStats, GameResult, Strategy, play_game, run_batch, run_game};
pub use powerups::{PowerUpConfig, PowerUpReport};

/// Which special tiles a game spawns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Numbers only.
    #[default]
    Classic,
    /// Special tiles spawn as the game goes on.
    Hazards,
}

/// Special-tile spawning in hazard mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Drops before the first spawn roll.
    pub start_after_moves: u32,
    /// Most special tiles allowed on the board at once.
    pub max_specials: usize,
    /// Per-turn chance of a steel plate.
    pub steel_chance: f64,
    /// Per-turn chance of a lead tile.
    pub lead_chance: f64,
    /// Per-turn chance of a glass tile.
    pub glass_chance: f64,
    /// Per-turn chance of an auto-swapper.
    pub swapper_chance: f64,
    /// Per-turn chance of a bomb.
    pub bomb_chance: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            start_after_moves: 10,
            max_specials: 4,
            steel_chance: 0.04,
            lead_chance: 0.05,
            glass_chance: 0.06,
            swapper_chance: 0.04,
            bomb_chance: 0.03,
        }
    }
}

impl SpawnConfig {
    /// Spawn chance for one kind.
    #[must_use]
    pub const fn chance(&self, special_type: SpecialType) -> f64 {
        match special_type {
            SpecialType::Steel => self.steel_chance,
            SpecialType::Lead => self.lead_chance,
            SpecialType::Glass => self.glass_chance,
            SpecialType::AutoSwapper => self.swapper_chance,
            SpecialType::Bomb => self.bomb_chance,
        }
    }
}

/// Everything needed to start a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for every random stream in the game.
    pub seed: u64,
    /// Special-tile spawning mode.
    pub mode: GameMode,
    /// Next-value generator tuning.
    pub generator: GeneratorConfig,
    /// Special-tile starting counters.
    pub special: SpecialConfig,
    /// Special-tile spawn chances.
    pub spawn: SpawnConfig,
    /// Power-up prices and rewards.
    pub powerups: PowerUpConfig,
}

/// Reasons a game action is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// The board refused the operation.
    Engine(EngineError),
    /// The power-up costs more coins than the player has.
    NotEnoughCoins {
        /// Price of the power-up.
        needed: u32,
        /// Coins held.
        available: u32,
    },
    /// Too few merges banked for a swap.
    SwapNotCharged {
        /// Merges required.
        needed: u32,
        /// Merges banked.
        available: u32,
    },
    /// Frenzy shifts need an active frenzy window.
    FrenzyInactive,
    /// The queued value is already a wildcard.
    WildcardQueued,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Engine(e) => write!(f, "{e}"),
            GameError::NotEnoughCoins { needed, available } => {
                write!(f, "Not enough coins: need {needed}, have {available}")
            }
            GameError::SwapNotCharged { needed, available } => {
                write!(f, "Swap not charged: need {needed} merges, have {available}")
            }
            GameError::FrenzyInactive => write!(f, "Frenzy is not active"),
            GameError::WildcardQueued => write!(f, "A wildcard is already queued"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for GameError {
    fn from(e: EngineError) -> Self {
        GameError::Engine(e)
    }
}

/// Result type for game actions.
pub type SessionResult<T> = Result<T, GameError>;

/// Everything a single drop caused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    /// The drop itself.
    pub drop: DropResult,
    /// Falls and fall-merges, in order.
    pub operations: Vec<Operation>,
    /// Special-tile events, in order.
    pub events: Vec<SpecialEvent>,
    /// Bombs that went off.
    pub explosions: Vec<ExplosionResult>,
    /// Special tiles spawned at the end of the turn.
    pub spawned: Vec<SpecialTileInfo>,
    /// Coins earned this turn.
    pub coins_earned: u32,
    /// Value queued for the next drop.
    pub next_value: DropValue,
}

/// Side effects gathered while resolving one action.
#[derive(Debug, Default)]
struct Resolution {
    operations: Vec<Operation>,
    events: Vec<SpecialEvent>,
    explosions: Vec<ExplosionResult>,
    pending_bombs: VecDeque<TileId>,
    merges: u32,
    blast_points: u64,
}

// Stream tags for seed derivation.
const GENERATOR_STREAM: u64 = 1;
const SPECIAL_STREAM: u64 = 2;
const SPAWN_STREAM: u64 = 3;

/// Seed of one random stream at a given move.
///
/// Every stream restarts from `(seed, move)` once a drop lands, so a game
/// restored from a snapshot continues exactly as the original would.
pub(crate) fn stream_seed(seed: u64, moves_used: u32, stream: u64) -> u64 {
    let mut x = seed
        ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ u64::from(moves_used).wrapping_mul(0xD1B5_4A32_D192_ED03);
    x ^= x >> 31;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^ (x >> 29)
}

/// A single game in progress.
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    board: BoardEngine,
    specials: SpecialTileEngine,
    generator: TileGenerator,
    spawn_rng: SmallRng,
    next_value: DropValue,
    coins: u32,
    frenzy_moves_left: u32,
}

impl Game {
    /// Start a new game.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let board = BoardEngine::new();
        let mut game = Self::from_parts(
            config,
            board,
            SpecialStats::default(),
            DropValue::Number(1),
            0,
            0,
        );
        game.coins = game.config.powerups.starting_coins;
        game.next_value = DropValue::Number(
            game.generator
                .next_value(game.board.grid(), game.board.score()),
        );
        debug!(seed = game.config.seed, mode = ?game.config.mode, "game started");
        game
    }

    /// Reassemble a game from saved state.
    pub(crate) fn from_parts(
        config: GameConfig,
        board: BoardEngine,
        stats: SpecialStats,
        next_value: DropValue,
        coins: u32,
        frenzy_moves_left: u32,
    ) -> Self {
        let moves = board.moves_used();
        let specials = SpecialTileEngine::with_stats(
            config.special,
            stream_seed(config.seed, moves, SPECIAL_STREAM),
            stats,
        );
        let generator = TileGenerator::new(
            config.generator.clone(),
            stream_seed(config.seed, moves, GENERATOR_STREAM),
        );
        let spawn_rng = SmallRng::seed_from_u64(stream_seed(config.seed, moves, SPAWN_STREAM));
        Self {
            config,
            board,
            specials,
            generator,
            spawn_rng,
            next_value,
            coins,
            frenzy_moves_left,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get the board.
    #[must_use]
    pub const fn board(&self) -> &BoardEngine {
        &self.board
    }

    /// Get the special-tile engine.
    #[must_use]
    pub const fn specials(&self) -> &SpecialTileEngine {
        &self.specials
    }

    /// Special tiles on the board, grouped by kind.
    #[must_use]
    pub fn collections(&self) -> SpecialCollections {
        SpecialCollections::from_grid(self.board.grid())
    }

    /// Value the next drop will use.
    #[must_use]
    pub const fn next_value(&self) -> DropValue {
        self.next_value
    }

    /// Coins held.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    /// Drops left in the current frenzy window.
    #[must_use]
    pub const fn frenzy_moves_left(&self) -> u32 {
        self.frenzy_moves_left
    }

    /// Check if a frenzy window is open.
    #[must_use]
    pub const fn frenzy_active(&self) -> bool {
        self.frenzy_moves_left > 0
    }

    /// Check if every column is full.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.board.grid().is_full()
    }

    /// Drop the queued value into a column and play out the turn.
    ///
    /// # Errors
    ///
    /// `GameError::Engine` if the board rejects the drop; nothing changes.
    pub fn drop_tile(&mut self, col: usize) -> SessionResult<TurnReport> {
        let drop = self.board.drop_tile(col, self.next_value)?;
        self.reseed();

        let mut resolution = Resolution::default();
        if let Some(site) = drop.merge_site() {
            self.resolve_merge(site, &mut resolution);
        }
        self.settle(&mut resolution);

        let events = self.specials.update_special_tiles(&mut self.board);
        resolution.events.extend(events);
        self.settle(&mut resolution);

        let spawned = self.spawn_specials();

        if self.frenzy_moves_left > 0 {
            self.frenzy_moves_left -= 1;
            if self.frenzy_moves_left == 0 {
                debug!("frenzy ended");
                self.settle(&mut resolution);
            }
        }

        let coins_earned = self.earn_coins(&resolution);
        self.next_value = DropValue::Number(
            self.generator
                .next_value(self.board.grid(), self.board.score()),
        );

        Ok(TurnReport {
            drop,
            operations: resolution.operations,
            events: resolution.events,
            explosions: resolution.explosions,
            spawned,
            coins_earned,
            next_value: self.next_value,
        })
    }

    fn reseed(&mut self) {
        let (seed, moves) = (self.config.seed, self.board.moves_used());
        self.generator
            .reseed(stream_seed(seed, moves, GENERATOR_STREAM));
        self.specials.reseed(stream_seed(seed, moves, SPECIAL_STREAM));
        self.spawn_rng = SmallRng::seed_from_u64(stream_seed(seed, moves, SPAWN_STREAM));
    }

    /// Apply the special-tile side effects of one merge.
    fn resolve_merge(&mut self, site: MergeSite, resolution: &mut Resolution) {
        resolution.merges += 1;
        let events = self.specials.on_merge(&mut self.board, site.at);
        resolution.events.extend(events);

        let explosion = match site.kind {
            MergeKind::Plain => return,
            MergeKind::Bomb => self
                .specials
                .on_bomb_merge(&mut self.board, site.at, site.value),
            // The moving bomb was consumed by the merge.
            MergeKind::BombPair => self.specials.detonate_bomb(&mut self.board, site.at),
        };
        Self::record_explosion(explosion, resolution);
    }

    fn record_explosion(explosion: ExplosionResult, resolution: &mut Resolution) {
        if !explosion.detonated {
            return;
        }
        resolution.blast_points += explosion.points;
        resolution.pending_bombs.extend(
            explosion
                .affected
                .iter()
                .filter(|tile| tile.effect == BlastEffect::ChainReaction)
                .map(|tile| tile.id),
        );
        resolution.explosions.push(explosion);
    }

    /// Run gravity and chained detonations until the board stops changing.
    ///
    /// Gravity is skipped while a frenzy window is open.
    fn settle(&mut self, resolution: &mut Resolution) {
        loop {
            let mut changed = false;

            if !self.frenzy_active() {
                let operations = self.board.apply_gravity();
                changed |= !operations.is_empty();
                for site in operations.iter().filter_map(Operation::merge_site) {
                    self.resolve_merge(site, resolution);
                }
                resolution.operations.extend(operations);
            }

            if let Some(id) = resolution.pending_bombs.pop_front() {
                if let Some(pos) = self.board.grid().find(id) {
                    let explosion = self.specials.detonate_bomb(&mut self.board, pos);
                    Self::record_explosion(explosion, resolution);
                }
                changed = true;
            }

            if !changed {
                break;
            }
        }
    }

    /// Roll for special tiles in hazard mode.
    fn spawn_specials(&mut self) -> Vec<SpecialTileInfo> {
        let mut spawned = Vec::new();
        let spawn = self.config.spawn;
        if self.config.mode != GameMode::Hazards
            || self.board.moves_used() <= spawn.start_after_moves
        {
            return spawned;
        }

        let mut on_board = self.collections().len();
        for special_type in SpecialType::ALL {
            if on_board >= spawn.max_specials {
                break;
            }
            if self.spawn_rng.r#gen::<f64>() >= spawn.chance(special_type) {
                continue;
            }
            let board = &mut self.board;
            let info = match special_type {
                SpecialType::Steel => self.specials.spawn_steel_plate(board, None, None),
                SpecialType::Lead => self.specials.spawn_lead_tile(board, None, None),
                SpecialType::Glass => self.specials.spawn_glass_tile(board, None, None, None),
                SpecialType::AutoSwapper => {
                    self.specials.spawn_auto_swapper(board, None, None, None)
                }
                SpecialType::Bomb => self.specials.spawn_bomb(board, None, None, None),
            };
            if let Some(info) = info {
                on_board += 1;
                spawned.push(info);
            }
        }
        spawned
    }

    fn earn_coins(&mut self, resolution: &Resolution) -> u32 {
        let powerups = &self.config.powerups;
        let blast_coins = if powerups.coins_per_blast_points == 0 {
            0
        } else {
            resolution.blast_points / u64::from(powerups.coins_per_blast_points)
        };
        let earned = resolution
            .merges
            .saturating_mul(powerups.coins_per_merge)
            .saturating_add(u32::try_from(blast_coins).unwrap_or(u32::MAX));
        self.coins = self.coins.saturating_add(earned);
        earned
    }
}
