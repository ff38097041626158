//! Command-line interface parsing for Power-Dict
//!
//! This module handles parsing of CLI arguments using clap and resolves the
//! data directory the stores live in.

use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

/// Log levels accepted by `--log-level`
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// No data directory was given and none could be derived
    #[error("Could not determine a data directory, pass --data-dir")]
    NoDataDir,

    /// The log level is not recognized
    #[error("Invalid log level: '{0}'. Valid levels: trace, debug, info, warn, error, off")]
    InvalidLogLevel(String),
}

/// Power-Dict - definitions and synonyms in your terminal
#[derive(Parser, Debug)]
#[command(name = "powerdict")]
#[command(about = "Look up definitions and synonyms, cached on disk")]
#[command(version)]
pub struct Cli {
    /// Directory holding the search history, cached results and API keys
    ///
    /// Defaults to the platform data directory, e.g. ~/.local/share/powerdict
    #[arg(long, value_name = "DIR", env = "POWERDICT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    ///
    /// Logs go to stderr. Valid levels: trace, debug, info, warn, error, off
    #[arg(long, value_name = "LEVEL", env = "POWERDICT_LOG", default_value = "warn")]
    pub log_level: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Where the index, keys and history live
    pub data_dir: PathBuf,
    /// Default tracing filter
    pub log_level: String,
}

/// Returns the platform data directory for Power-Dict
///
/// Uses `~/.local/share/powerdict/` on Linux, or the equivalent elsewhere.
/// Returns `None` if no home directory can be determined.
pub fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "powerdict").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Parses a log level argument, ignoring case
pub fn parse_log_level(s: &str) -> Result<String, CliError> {
    let level = s.trim().to_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(CliError::InvalidLogLevel(s.to_string()))
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// The data directory is `--data-dir` if given, otherwise the platform
    /// data directory, otherwise the current working directory.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let log_level = parse_log_level(&cli.log_level)?;

        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()
                .or_else(|| std::env::current_dir().ok())
                .ok_or(CliError::NoDataDir)?,
        };

        Ok(StartupConfig {
            data_dir,
            log_level,
        })
    }
}
