//! `export` subcommand arguments.
//!
//! Export writes the saved board as a standalone snapshot, for version control
//! or for `diff`.

use crate::persist::sink::is_gzip_path;
use clap::Args;
use std::path::PathBuf;

/// Write the board snapshot to a file or stdout
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Gzip the output even without a .gz extension
    #[arg(long)]
    pub gzip: bool,

    /// Write JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

impl ExportArgs {
    pub fn should_compress(&self) -> bool {
        self.gzip || self.output.as_deref().is_some_and(is_gzip_path)
    }
}
