//! Show command implementation.

use super::CliError;
use mergedrop::{Game, GameSnapshot, render_ascii};
use std::path::Path;

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or restored.
pub(crate) fn execute(path: &Path) -> Result<(), CliError> {
    let snapshot = GameSnapshot::load(path)?;
    let seed = snapshot.config.seed;
    let game = Game::restore(snapshot)?;

    println!("{} (seed {seed}, {:?})", path.display(), game.config().mode);
    println!();
    print!("{}", render_ascii(&game));
    Ok(())
}
