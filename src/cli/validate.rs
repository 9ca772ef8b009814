//! Snapshot validation command implementation.

use super::CliError;
use mergedrop::board::{check_invariants, check_settled};
use mergedrop::{Game, GameSnapshot};
use std::path::Path;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or is inconsistent.
pub(crate) fn execute(path: &Path) -> Result<(), CliError> {
    println!("Validating: {}", path.display());
    println!();

    let snapshot = match GameSnapshot::load(path) {
        Ok(snapshot) => {
            print_check("Snapshot parses", true);
            snapshot
        }
        Err(e) => {
            print_check("Snapshot parses", false);
            return Err(e.into());
        }
    };

    let game = match Game::restore(snapshot) {
        Ok(game) => {
            print_check("State consistent", true);
            game
        }
        Err(e) => {
            print_check("State consistent", false);
            return Err(e.into());
        }
    };

    let violations = check_invariants(game.board());
    print_check("Board invariants", violations.is_empty());
    let floats = check_settled(game.board().grid());
    // Floating tiles are legal while a frenzy window is open.
    let settled_ok = floats.is_empty() || game.frenzy_active();
    print_check("Board settled", settled_ok);

    if !violations.is_empty() || !settled_ok {
        println!();
        for violation in violations.iter().chain(&floats) {
            println!("  - {violation}");
        }
        return Err(CliError::new(format!(
            "{} problem(s) found",
            violations.len() + floats.len()
        )));
    }

    let board = game.board();
    println!();
    println!("Summary:");
    println!("  Score:          {}", board.score());
    println!("  Moves:          {}", board.moves_used());
    println!("  Tiles:          {}", board.grid().occupied());
    println!("  Special tiles:  {}", game.collections().len());
    println!("  Next tile id:   {}", board.next_tile_id());

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
