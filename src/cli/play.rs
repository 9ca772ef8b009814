//! Play command implementation.

use super::output::{JsonGameResult, format_text, format_turn};
use super::{CliError, PlayFormat};
use mergedrop::session::{Autoplayer, GameResult, Strategy};
use mergedrop::{Game, GameConfig, render_ascii};
use std::path::PathBuf;

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be saved or output fails.
pub(crate) fn execute(
    config: GameConfig,
    moves: u32,
    strategy: Strategy,
    format: PlayFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let verbose = !quiet && format == PlayFormat::Text;
    if verbose {
        println!("Running game with seed {} ({:?})...", config.seed, config.mode);
        println!();
    }

    let seed = config.seed;
    let mut game = Game::new(config);
    let mut player = Autoplayer::new(strategy, seed);
    while game.board().moves_used() < moves {
        let Some(report) = player.play_turn(&mut game) else {
            break;
        };
        if verbose {
            println!("{}", format_turn(game.board().moves_used(), &report));
        }
    }

    if let Some(save_path) = save {
        game.snapshot()
            .save(&save_path)
            .map_err(|e| CliError::new(format!("Failed to save snapshot: {e}")))?;
        if verbose {
            println!();
            println!("Snapshot saved to: {}", save_path.display());
        }
    }

    let result = GameResult::from_game(&game);
    match format {
        PlayFormat::Text => {
            if !quiet {
                println!();
                print!("{}", render_ascii(&game));
                println!();
            }
            print!("{}", format_text(&result));
        }
        PlayFormat::Json => {
            let json_result = JsonGameResult::from_game_result(&result);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
