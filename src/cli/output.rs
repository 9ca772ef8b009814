//! Output formatting utilities for CLI.

use mergedrop::TurnReport;
use mergedrop::session::{BatchStats, GameResult};
use mergedrop::special::SpecialStats;
use serde::Serialize;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonGameResult {
    /// Random seed used.
    pub(super) seed: u64,
    /// Drops played.
    pub(super) moves: u32,
    /// Final score.
    pub(super) score: u64,
    /// Highest tile on the final board.
    pub(super) highest_tile: u32,
    /// Merges over the game.
    pub(super) merges: u32,
    /// Whether the board filled up.
    pub(super) game_over: bool,
    /// Special-tile totals.
    pub(super) specials: SpecialStats,
}

impl JsonGameResult {
    /// Create from a `GameResult`.
    pub(super) fn from_game_result(result: &GameResult) -> Self {
        Self {
            seed: result.seed,
            moves: result.moves,
            score: result.score,
            highest_tile: result.highest_tile,
            merges: result.merges,
            game_over: result.game_over,
            specials: result.specials,
        }
    }
}

/// One line describing a turn.
pub(super) fn format_turn(turn: u32, report: &TurnReport) -> String {
    let drop = &report.drop;
    let mut line = format!(
        "Turn {turn}: {} into column {}",
        drop.final_value, drop.col
    );
    if drop.merged {
        line.push_str(" (merged)");
    }
    if !report.operations.is_empty() {
        line.push_str(&format!(", {} falls", report.operations.len()));
    }
    for explosion in &report.explosions {
        line.push_str(&format!(", bomb at {} (+{})", explosion.center, explosion.points));
    }
    for info in &report.spawned {
        line.push_str(&format!(
            ", {} spawned at {}",
            info.kind.special_type().as_str(),
            info.pos
        ));
    }
    line
}

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Game Result (seed: {})\n", result.seed));
    output.push_str(&format!("  Score: {}\n", result.score));
    output.push_str(&format!("  Moves: {}\n", result.moves));
    output.push_str(&format!("  Highest tile: {}\n", result.highest_tile));
    output.push_str(&format!("  Merges: {}\n", result.merges));
    output.push_str(&format!(
        "  Ended: {}\n",
        if result.game_over { "board full" } else { "move limit" }
    ));
    format_specials(&mut output, &result.specials);

    output
}

fn format_specials(output: &mut String, specials: &SpecialStats) {
    output.push_str("\nSpecial Tiles:\n");
    output.push_str(&format!("  Lead cleared:     {}\n", specials.lead_cleared));
    output.push_str(&format!("  Steel expired:    {}\n", specials.steel_expired));
    output.push_str(&format!("  Glass broken:     {}\n", specials.glass_broken));
    output.push_str(&format!("  Bombs detonated:  {}\n", specials.bombs_detonated));
    output.push_str(&format!("  Swaps performed:  {}\n", specials.swaps_performed));
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Total games played.
    games_played: u64,
    /// Games that ended with a full board.
    game_overs: u64,
    /// Average score.
    avg_score: f64,
    /// Score standard deviation.
    score_std_dev: f64,
    /// Best score seen.
    best_score: u64,
    /// Seed of the best game.
    best_seed: u64,
    /// Highest tile seen.
    highest_tile: u32,
    /// Average game length in drops.
    avg_moves: f64,
    /// Special-tile totals.
    specials: SpecialStats,
}

impl JsonBatchResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &BatchStats) -> Self {
        Self {
            games_played: stats.games_played,
            game_overs: stats.game_overs,
            avg_score: stats.avg_score(),
            score_std_dev: stats.score_std_dev(),
            best_score: stats.best_score,
            best_seed: stats.best_seed,
            highest_tile: stats.highest_tile,
            avg_moves: stats.avg_moves(),
            specials: stats.specials,
        }
    }
}

/// Format batch stats as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_batch_text(stats: &BatchStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("Batch Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str(&format!(
        "Average Score: {:.1} (+/- {:.1})\n",
        stats.avg_score(),
        stats.score_std_dev()
    ));
    output.push_str(&format!(
        "Best Score:    {} (seed {})\n",
        stats.best_score, stats.best_seed
    ));
    output.push_str(&format!("Highest Tile:  {}\n", stats.highest_tile));
    let rate = if stats.games_played == 0 {
        0.0
    } else {
        stats.game_overs as f64 / stats.games_played as f64 * 100.0
    };
    output.push_str(&format!(
        "Board Full:    {} ({rate:.1}%)\n",
        stats.game_overs
    ));
    format_specials(&mut output, &stats.specials);

    output.push_str(&format!(
        "\nAverage Game Length: {:.0} moves\n",
        stats.avg_moves()
    ));

    output
}

/// Format batch stats as CSV.
pub(super) fn format_batch_csv(stats: &BatchStats) -> String {
    let mut output = String::new();

    // Header
    output.push_str(
        "games,game_overs,avg_score,score_std_dev,best_score,best_seed,highest_tile,avg_moves,\
         lead_cleared,steel_expired,glass_broken,bombs_detonated,swaps_performed\n",
    );

    let specials = &stats.specials;
    output.push_str(&format!(
        "{},{},{:.2},{:.2},{},{},{},{:.2},{},{},{},{},{}\n",
        stats.games_played,
        stats.game_overs,
        stats.avg_score(),
        stats.score_std_dev(),
        stats.best_score,
        stats.best_seed,
        stats.highest_tile,
        stats.avg_moves(),
        specials.lead_cleared,
        specials.steel_expired,
        specials.glass_broken,
        specials.bombs_detonated,
        specials.swaps_performed,
    ));

    output
}
