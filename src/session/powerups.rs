//! Coin-priced power-ups.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Game, GameError, Resolution, SessionResult};
use crate::board::{Direction, DropValue, Operation, Pos, ShiftDirection};
use crate::special::{ExplosionResult, SpecialEvent};

/// Power-up prices and rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    /// Coins at the start of a game.
    pub starting_coins: u32,
    /// Coins per merge.
    pub coins_per_merge: u32,
    /// Blast points per coin. Zero disables blast rewards.
    pub coins_per_blast_points: u32,
    /// Price of a board shift.
    pub shift_cost: u32,
    /// Price of a frenzy window.
    pub frenzy_cost: u32,
    /// Drops a frenzy window lasts.
    pub frenzy_moves: u32,
    /// Banked merges a swap uses up.
    pub swap_charge: u32,
    /// Price of a forced merge.
    pub force_merge_cost: u32,
    /// Price of turning the queued value into a wildcard.
    pub wildcard_cost: u32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            starting_coins: 0,
            coins_per_merge: 1,
            coins_per_blast_points: 10,
            shift_cost: 10,
            frenzy_cost: 25,
            frenzy_moves: 5,
            swap_charge: 5,
            force_merge_cost: 15,
            wildcard_cost: 20,
        }
    }
}

/// Everything a power-up caused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerUpReport {
    /// Moves, merges, falls and fall-merges, in order.
    pub operations: Vec<Operation>,
    /// Special-tile events, in order.
    pub events: Vec<SpecialEvent>,
    /// Bombs that went off.
    pub explosions: Vec<ExplosionResult>,
}

impl Game {
    /// Shift every row one step, then settle the board.
    ///
    /// # Errors
    ///
    /// `NotEnoughCoins`.
    pub fn shift(&mut self, direction: ShiftDirection) -> SessionResult<PowerUpReport> {
        self.spend(self.config.powerups.shift_cost)?;
        let operations = self.board.shift_board(direction);
        Ok(self.resolve_operations(operations))
    }

    /// Open a frenzy window: gravity stops and frenzy shifts are free for
    /// the next few drops.
    ///
    /// # Errors
    ///
    /// `NotEnoughCoins`.
    pub fn activate_frenzy(&mut self) -> SessionResult<()> {
        self.spend(self.config.powerups.frenzy_cost)?;
        self.frenzy_moves_left = self.config.powerups.frenzy_moves.max(1);
        debug!(moves = self.frenzy_moves_left, "frenzy started");
        Ok(())
    }

    /// Shift in any direction during a frenzy window.
    ///
    /// # Errors
    ///
    /// `FrenzyInactive` outside a frenzy window.
    pub fn frenzy_shift(&mut self, direction: Direction) -> SessionResult<PowerUpReport> {
        if !self.frenzy_active() {
            return Err(GameError::FrenzyInactive);
        }
        let operations = self.board.frenzy_shift(direction);
        Ok(self.resolve_operations(operations))
    }

    /// Swap two tiles, using up the banked merge charge.
    ///
    /// # Errors
    ///
    /// `SwapNotCharged`, or an engine error for obstacles, empty cells and
    /// positions off the board.
    pub fn swap(&mut self, a: Pos, b: Pos) -> SessionResult<()> {
        let needed = self.config.powerups.swap_charge;
        let available = self.board.merge_count();
        if available < needed {
            return Err(GameError::SwapNotCharged { needed, available });
        }
        self.board.swap_cells(a, b)?;
        self.board.consume_merges(needed);
        Ok(())
    }

    /// Merge the tile at `from` into the tile at `into`, then settle.
    ///
    /// # Errors
    ///
    /// `NotEnoughCoins`, or an engine error if the tiles cannot merge.
    pub fn force_merge(&mut self, from: Pos, into: Pos) -> SessionResult<PowerUpReport> {
        let cost = self.config.powerups.force_merge_cost;
        self.check_coins(cost)?;
        let operation = self.board.merge_cells(from, into)?;
        self.coins -= cost;
        Ok(self.resolve_operations(vec![operation]))
    }

    /// Replace the queued value with a wildcard.
    ///
    /// # Errors
    ///
    /// `WildcardQueued` or `NotEnoughCoins`.
    pub fn use_wildcard(&mut self) -> SessionResult<()> {
        if self.next_value == DropValue::Wildcard {
            return Err(GameError::WildcardQueued);
        }
        self.spend(self.config.powerups.wildcard_cost)?;
        self.next_value = DropValue::Wildcard;
        Ok(())
    }

    fn check_coins(&self, needed: u32) -> SessionResult<()> {
        if self.coins < needed {
            return Err(GameError::NotEnoughCoins {
                needed,
                available: self.coins,
            });
        }
        Ok(())
    }

    fn spend(&mut self, cost: u32) -> SessionResult<()> {
        self.check_coins(cost)?;
        self.coins -= cost;
        Ok(())
    }

    fn resolve_operations(&mut self, operations: Vec<Operation>) -> PowerUpReport {
        let mut resolution = Resolution::default();
        for site in operations.iter().filter_map(Operation::merge_site) {
            self.resolve_merge(site, &mut resolution);
        }
        resolution.operations = operations;
        self.settle(&mut resolution);
        PowerUpReport {
            operations: resolution.operations,
            events: resolution.events,
            explosions: resolution.explosions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{COLS, ROWS, check_settled};
    use crate::error::EngineError;
    use crate::session::GameConfig;

    fn rich_game() -> Game {
        Game::new(GameConfig {
            seed: 4,
            powerups: PowerUpConfig {
                starting_coins: 100,
                swap_charge: 1,
                ..PowerUpConfig::default()
            },
            ..GameConfig::default()
        })
    }

    #[test]
    fn test_shift_costs_coins() {
        let mut game = Game::new(GameConfig::default());
        assert_eq!(
            game.shift(ShiftDirection::Left),
            Err(GameError::NotEnoughCoins {
                needed: 10,
                available: 0
            })
        );

        let mut game = rich_game();
        game.drop_tile(COLS - 1).unwrap();
        game.shift(ShiftDirection::Left).unwrap();
        assert_eq!(game.coins(), 90);
        assert!(check_settled(game.board().grid()).is_empty());
    }

    #[test]
    fn test_frenzy_window() {
        let mut game = rich_game();
        assert_eq!(
            game.frenzy_shift(Direction::Up),
            Err(GameError::FrenzyInactive)
        );

        game.activate_frenzy().unwrap();
        assert!(game.frenzy_active());
        game.drop_tile(0).unwrap();
        game.frenzy_shift(Direction::Up).unwrap();
        // Gravity is suspended, so the tile stays lifted.
        assert!(game.board().grid().is_empty_at(Pos::new(0, ROWS - 1)));

        for col in 1..COLS {
            game.drop_tile(col).unwrap();
        }
        game.drop_tile(1).unwrap();
        assert!(!game.frenzy_active());
        assert!(check_settled(game.board().grid()).is_empty());
    }

    #[test]
    fn test_swap_needs_charge() {
        let mut game = rich_game();
        game.drop_tile(0).unwrap();
        game.drop_tile(1).unwrap();
        let a = Pos::new(0, ROWS - 1);
        let b = Pos::new(1, ROWS - 1);
        assert_eq!(
            game.swap(a, b),
            Err(GameError::SwapNotCharged {
                needed: 1,
                available: 0
            })
        );

        // A wildcard always merges with the tile below it.
        game.use_wildcard().unwrap();
        game.drop_tile(0).unwrap();
        let banked = game.board().merge_count();
        assert!(banked >= 1);

        let before_a = game.board().grid().get(a).copied();
        let before_b = game.board().grid().get(b).copied();
        game.swap(a, b).unwrap();
        assert_eq!(game.board().grid().get(a).copied(), before_b);
        assert_eq!(game.board().grid().get(b).copied(), before_a);
        assert_eq!(game.board().merge_count(), banked - 1);
    }

    #[test]
    fn test_failed_swap_keeps_charge() {
        let mut game = rich_game();
        game.drop_tile(0).unwrap();
        game.use_wildcard().unwrap();
        game.drop_tile(0).unwrap();
        let banked = game.board().merge_count();

        let result = game.swap(Pos::new(0, ROWS - 1), Pos::new(3, 0));
        assert_eq!(
            result,
            Err(GameError::Engine(EngineError::EmptyCell {
                pos: Pos::new(3, 0)
            }))
        );
        assert_eq!(game.board().merge_count(), banked);
    }

    #[test]
    fn test_force_merge_rejects_incompatible() {
        let mut game = rich_game();
        game.drop_tile(0).unwrap();
        assert_eq!(
            game.force_merge(Pos::new(0, ROWS - 1), Pos::new(1, ROWS - 1)),
            Err(GameError::Engine(EngineError::EmptyCell {
                pos: Pos::new(1, ROWS - 1)
            }))
        );
        assert_eq!(game.coins(), 100);
    }

    #[test]
    fn test_wildcard_once() {
        let mut game = rich_game();
        game.use_wildcard().unwrap();
        assert_eq!(game.next_value(), DropValue::Wildcard);
        assert_eq!(game.use_wildcard(), Err(GameError::WildcardQueued));
        assert_eq!(game.coins(), 80);

        let report = game.drop_tile(0).unwrap();
        assert_eq!(report.drop.final_value, 3);
    }
}
