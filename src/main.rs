//! Mergedrop CLI - play, batch-run and inspect mergedrop games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Mergedrop - a deterministic column-drop merging puzzle
#[derive(Parser, Debug)]
#[command(name = "mergedrop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Game configuration file (JSON `GameConfig`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity (-v debug, -vv trace); `RUST_LOG` overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Autoplay a single game
    Play {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum drops (default: 500)
        #[arg(short, long, default_value = "500")]
        moves: u32,

        /// Column-picking strategy
        #[arg(long, default_value = "greedy")]
        strategy: cli::StrategyArg,

        /// Special-tile mode (default: from config)
        #[arg(long)]
        mode: Option<cli::ModeArg>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::PlayFormat,

        /// Save a snapshot of the final game
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress turn-by-turn output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Autoplay many games in parallel and aggregate statistics
    Batch {
        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum drops per game (default: 500)
        #[arg(short, long, default_value = "500")]
        moves: u32,

        /// Column-picking strategy
        #[arg(long, default_value = "greedy")]
        strategy: cli::StrategyArg,

        /// Special-tile mode (default: from config)
        #[arg(long)]
        mode: Option<cli::ModeArg>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::BatchFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print a saved game
    Show {
        /// Snapshot file (.json)
        #[arg(required = true)]
        snapshot: PathBuf,
    },

    /// Check a saved game for consistency
    Validate {
        /// Snapshot file (.json)
        #[arg(required = true)]
        snapshot: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "mergedrop=debug",
        _ => "mergedrop=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Play {
            seed,
            moves,
            strategy,
            mode,
            format,
            save,
            quiet,
        } => cli::load_config(args.config.as_deref(), seed, mode).and_then(|config| {
            cli::play::execute(config, moves, strategy.into(), format, save, quiet)
        }),

        Commands::Batch {
            games,
            seed,
            moves,
            strategy,
            mode,
            threads,
            format,
            progress,
        } => cli::load_config(args.config.as_deref(), seed, mode).and_then(|config| {
            cli::batch::execute(config, games, moves, strategy.into(), threads, format, progress)
        }),

        Commands::Show { snapshot } => cli::show::execute(&snapshot),

        Commands::Validate { snapshot } => cli::validate::execute(&snapshot),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
