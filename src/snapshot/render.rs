//! Plain-text board renderer for the CLI and debugging.

use crate::board::{COLS, Cell, DropValue, Pos, ROWS};
use crate::session::Game;
use crate::special::SpecialKind;

/// Width of one rendered cell, separator excluded.
const CELL_WIDTH: usize = 6;

/// Render a game as text.
///
/// Output format:
/// ```text
/// Score 42  Moves 17  Coins 3  Next 2
/// ┌──────┬──────┬──────┬──────┐
/// │      │      │      │      │
/// │  #4  │      │      │      │
/// │    3 │  6g2 │      │    1 │
/// └──────┴──────┴──────┴──────┘
///    0      1      2      3
///
/// Legend: #=Steel(turns)  L=Lead(countdown)  g=Glass(durability)
///         s=Swapper(next swap)  *=Bomb(merges left)
/// ```
#[must_use]
pub fn render_ascii(game: &Game) -> String {
    let mut output = String::new();
    render_header(&mut output, game);
    render_board(&mut output, game);
    output.push_str("\nLegend: #=Steel(turns)  L=Lead(countdown)  g=Glass(durability)\n");
    output.push_str("        s=Swapper(next swap)  *=Bomb(merges left)\n");
    if game.is_game_over() {
        output.push_str("\nGAME OVER\n");
    }
    output
}

fn render_header(output: &mut String, game: &Game) {
    let board = game.board();
    let next = match game.next_value() {
        DropValue::Number(value) => value.to_string(),
        DropValue::Wildcard => "?".to_string(),
    };
    output.push_str(&format!(
        "Score {}  Moves {}  Coins {}  Next {next}",
        board.score(),
        board.moves_used(),
        game.coins(),
    ));
    if game.frenzy_active() {
        output.push_str(&format!("  FRENZY {}", game.frenzy_moves_left()));
    }
    output.push('\n');
}

fn render_board(output: &mut String, game: &Game) {
    let grid = game.board().grid();
    let bar = "─".repeat(CELL_WIDTH);

    output.push('┌');
    output.push_str(&vec![bar.as_str(); COLS].join("┬"));
    output.push_str("┐\n");

    for row in 0..ROWS {
        output.push('│');
        for col in 0..COLS {
            let label = grid.get(Pos::new(col, row)).map_or_else(String::new, cell_label);
            output.push_str(&format!(" {label:>width$} │", width = CELL_WIDTH - 2));
        }
        output.push('\n');
    }

    output.push('└');
    output.push_str(&vec![bar.as_str(); COLS].join("┴"));
    output.push_str("┘\n");

    for col in 0..COLS {
        output.push_str(&format!("{col:^width$} ", width = CELL_WIDTH));
    }
    output.push('\n');
}

/// Short label for a cell.
fn cell_label(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Number(tile) => tile.value.to_string(),
        Cell::Special(special) => match special.kind {
            SpecialKind::Steel { turns_remaining } => format!("#{turns_remaining}"),
            SpecialKind::Lead { countdown } => format!("L{countdown}"),
            SpecialKind::Glass { value, durability } => format!("{value}g{durability}"),
            SpecialKind::AutoSwapper {
                value,
                next_swap_in,
                ..
            } => format!("{value}s{next_swap_in}"),
            SpecialKind::Bomb {
                value,
                merges_remaining,
            } => format!("{value}*{merges_remaining}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GameConfig;
    use crate::special::SpecialTile;

    #[test]
    fn test_render_shape() {
        let mut game = Game::new(GameConfig::default());
        game.drop_tile(2).unwrap();
        let text = render_ascii(&game);

        assert!(text.starts_with("Score "));
        assert!(text.contains("Moves 1"));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with('┌'));
        assert!(lines[ROWS + 2].starts_with('└'));
        // Every row is as wide as the borders.
        let width = lines[1].chars().count();
        for line in &lines[2..ROWS + 2] {
            assert_eq!(line.chars().count(), width);
        }
        assert!(!text.contains("GAME OVER"));
    }

    #[test]
    fn test_special_labels() {
        let steel = Cell::Special(SpecialTile::new(
            1,
            SpecialKind::Steel { turns_remaining: 4 },
        ));
        let glass = Cell::Special(SpecialTile::new(
            2,
            SpecialKind::Glass {
                value: 6,
                durability: 2,
            },
        ));
        let bomb = Cell::Special(SpecialTile::new(
            3,
            SpecialKind::Bomb {
                value: 3,
                merges_remaining: 1,
            },
        ));
        assert_eq!(cell_label(&steel), "#4");
        assert_eq!(cell_label(&glass), "6g2");
        assert_eq!(cell_label(&bomb), "3*1");
        assert_eq!(cell_label(&Cell::Empty), "");
    }
}
