//! CLI command implementations for mergedrop.

pub(crate) mod batch;
pub(crate) mod play;
pub(crate) mod show;
pub(crate) mod validate;

mod output;

use clap::ValueEnum;
use mergedrop::session::Strategy;
use mergedrop::{GameConfig, GameMode};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Output format for the `play` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PlayFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `batch` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BatchFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Autoplay strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StrategyArg {
    /// Uniformly random open column.
    Random,
    /// Best merge, otherwise the shortest column.
    Greedy,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Random => Strategy::Random,
            StrategyArg::Greedy => Strategy::Greedy,
        }
    }
}

/// Special-tile mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Numbers only.
    Classic,
    /// Special tiles spawn during play.
    Hazards,
}

impl From<ModeArg> for GameMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Classic => GameMode::Classic,
            ModeArg::Hazards => GameMode::Hazards,
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<mergedrop::SnapshotError> for CliError {
    fn from(e: mergedrop::SnapshotError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<mergedrop::GameError> for CliError {
    fn from(e: mergedrop::GameError) -> Self {
        Self::new(e.to_string())
    }
}

/// Build the game config: the config file (or defaults), then flag overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub(crate) fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
    mode: Option<ModeArg>,
) -> Result<GameConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                CliError::new(format!("Failed to read {}: {e}", path.display()))
            })?;
            serde_json::from_str(&text).map_err(|e| {
                CliError::new(format!("Invalid config {}: {e}", path.display()))
            })?
        }
        None => GameConfig::default(),
    };

    // A seed flag wins; without a config file the seed is random
    if let Some(seed) = seed {
        config.seed = seed;
    } else if path.is_none() {
        use std::time::{SystemTime, UNIX_EPOCH};
        config.seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(42);
    }
    if let Some(mode) = mode {
        config.mode = mode.into();
    }
    Ok(config)
}
