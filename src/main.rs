//! Task board CLI
//!
//! Loads the configured board, applies one command and saves it.

use anyhow::Result;
use clap::Parser;
use task_board::cli::run::execute;
use task_board::cli::Cli;
use task_board::config::Config;
use task_board::logging::{self, LogTarget};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(file) = &cli.file {
        config.storage.path = file.clone();
    }
    debug!(path = %config.storage.path.display(), "using snapshot");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &config, &mut out)
}
