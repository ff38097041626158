//! Power-Dict - look up definitions and synonyms from the terminal
//!
//! Results are cached on disk so repeated searches work offline.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use powerdict::cli::{Cli, StartupConfig};
use powerdict::menu::{Menu, MenuError};
use powerdict::store::IdGenerator;

/// Sends logs to stderr so they never mix with the menu on stdout
///
/// `RUST_LOG` wins over `--log-level` when set.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_level);
    tracing::debug!(data_dir = %config.data_dir.display(), "starting");

    let stdin = io::stdin();
    let stdout = io::stdout();

    let ids = IdGenerator::new();
    let mut menu = match Menu::open(stdin.lock(), stdout.lock(), &config.data_dir, ids) {
        Ok(menu) => menu,
        Err(MenuError::InputClosed) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = menu.run().await {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = menu.close() {
        eprintln!("Error: unable to save history: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
