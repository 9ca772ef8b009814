//! Weighted choice of the next drop value.
//!
//! Ones and twos share a base weight that tilts towards whichever is scarcer
//! on the board. Threes carry a small fixed weight. Higher values unlock as
//! the score passes per-value thresholds and thin out the base weights.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::grid::Grid;

/// A value that joins the draw once the score reaches a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueUnlock {
    /// The unlocked tile value.
    pub value: u32,
    /// Score at which it unlocks.
    pub score: u64,
}

/// Generator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Starting weight of both 1 and 2.
    pub base_weight: f64,
    /// Fixed weight of 3.
    pub three_weight: f64,
    /// How far apart the 1 and 2 counts may drift before rebalancing.
    pub imbalance_threshold: usize,
    /// Weight moved from the common value to the rare one per excess tile.
    pub imbalance_step: f64,
    /// Floor for a rebalanced base weight.
    pub min_base_weight: f64,
    /// Score-gated higher values.
    pub unlocks: Vec<ValueUnlock>,
    /// Weight of a freshly unlocked value.
    pub unlock_weight: f64,
    /// Cap on how much an unlocked value's weight may grow with score.
    pub unlock_growth_cap: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_weight: 45.0,
            three_weight: 8.0,
            imbalance_threshold: 6,
            imbalance_step: 5.0,
            min_base_weight: 5.0,
            unlocks: vec![
                ValueUnlock { value: 6, score: 250 },
                ValueUnlock {
                    value: 12,
                    score: 1000,
                },
                ValueUnlock {
                    value: 24,
                    score: 3000,
                },
                ValueUnlock {
                    value: 48,
                    score: 8000,
                },
            ],
            unlock_weight: 2.0,
            unlock_growth_cap: 2.0,
        }
    }
}

/// Seeded next-value generator.
#[derive(Debug, Clone)]
pub struct TileGenerator {
    config: GeneratorConfig,
    rng: SmallRng,
}

impl TileGenerator {
    /// Create a generator with the given tuning and seed.
    #[must_use]
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Get the tuning.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Restart the random stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Current weight of every drawable value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weights(&self, grid: &Grid, score: u64) -> Vec<(u32, f64)> {
        let config = &self.config;
        let ones = grid.count_value(1);
        let twos = grid.count_value(2);

        let mut one_weight = config.base_weight;
        let mut two_weight = config.base_weight;
        let excess = ones.abs_diff(twos).saturating_sub(config.imbalance_threshold);
        if excess > 0 {
            let (common, rare) = if ones > twos {
                (&mut one_weight, &mut two_weight)
            } else {
                (&mut two_weight, &mut one_weight)
            };
            let moved = (excess as f64 * config.imbalance_step)
                .min(*common - config.min_base_weight)
                .max(0.0);
            *common -= moved;
            *rare += moved;
        }

        let unlocked: Vec<(u32, f64)> = config
            .unlocks
            .iter()
            .filter(|unlock| score >= unlock.score)
            .map(|unlock| {
                let progress = if unlock.score == 0 {
                    config.unlock_growth_cap
                } else {
                    (score - unlock.score) as f64 / unlock.score as f64
                };
                let weight =
                    config.unlock_weight * (1.0 + progress.min(config.unlock_growth_cap));
                (unlock.value, weight)
            })
            .collect();

        let total_high: f64 = unlocked.iter().map(|(_, weight)| weight).sum();
        let dampening = 1.0 - (total_high / 100.0).min(0.5);

        let mut weights = vec![
            (1, one_weight * dampening),
            (2, two_weight * dampening),
            (3, config.three_weight),
        ];
        weights.extend(unlocked);
        weights
    }

    /// Draw the next drop value.
    pub fn next_value(&mut self, grid: &Grid, score: u64) -> u32 {
        let weights = self.weights(grid, score);
        let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
        let draw = self.rng.r#gen::<f64>() * total;

        let mut cumulative = 0.0;
        for &(value, weight) in &weights {
            cumulative += weight;
            if draw < cumulative {
                return value;
            }
        }
        weights.last().map_or(1, |&(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, Pos, ROWS, Tile};

    fn weight_of(weights: &[(u32, f64)], value: u32) -> f64 {
        weights
            .iter()
            .find(|(v, _)| *v == value)
            .map_or(0.0, |(_, weight)| *weight)
    }

    #[test]
    fn test_balanced_board_weights() {
        let generator = TileGenerator::new(GeneratorConfig::default(), 1);
        let weights = generator.weights(&Grid::new(), 0);
        assert_eq!(weights.len(), 3);
        assert!((weight_of(&weights, 1) - 45.0).abs() < f64::EPSILON);
        assert!((weight_of(&weights, 2) - 45.0).abs() < f64::EPSILON);
        assert!((weight_of(&weights, 3) - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_imbalance_favours_rare_value() {
        let mut grid = Grid::new();
        let mut id = 1;
        for col in 0..4 {
            for row in ROWS - 2..ROWS {
                grid.set(Pos::new(col, row), Cell::Number(Tile::new(id, 1)));
                id += 1;
            }
        }
        // Eight ones, no twos: two past the threshold.
        let generator = TileGenerator::new(GeneratorConfig::default(), 1);
        let weights = generator.weights(&grid, 0);
        assert!((weight_of(&weights, 1) - 35.0).abs() < 1e-9);
        assert!((weight_of(&weights, 2) - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_unlocks_follow_score() {
        let generator = TileGenerator::new(GeneratorConfig::default(), 1);
        assert_eq!(generator.weights(&Grid::new(), 249).len(), 3);

        let weights = generator.weights(&Grid::new(), 500);
        assert!((weight_of(&weights, 6) - 4.0).abs() < 1e-9);
        assert!(weight_of(&weights, 1) < 45.0);
        assert!(weight_of(&weights, 12).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let grid = Grid::new();
        let mut a = TileGenerator::new(GeneratorConfig::default(), 42);
        let mut b = TileGenerator::new(GeneratorConfig::default(), 42);
        let seq_a: Vec<u32> = (0..32).map(|_| a.next_value(&grid, 0)).collect();
        let seq_b: Vec<u32> = (0..32).map(|_| b.next_value(&grid, 0)).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().all(|v| [1, 2, 3].contains(v)));
    }
}
