//! CLI command definitions for task-board
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands;
//! [`run::execute`] carries them out against a board.

pub mod diff;
pub mod export;
pub mod run;
pub mod task;

use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand};
use diff::DiffArgs;
use export::ExportArgs;
use std::path::PathBuf;
use task::{AddArgs, EditArgs};

/// Task board: task cards linked by directed connections
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file (overrides config)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the board
    Show(ShowArgs),

    /// Create a task
    Add(AddArgs),

    /// Change fields of a task
    Edit(EditArgs),

    /// Move a task card
    Move {
        id: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Delete a task and every connection touching it
    Remove { id: String },

    /// Connect one task to another
    Connect { from: String, to: String },

    /// Delete a connection
    Disconnect { id: String },

    /// Write the board snapshot to a file or stdout
    Export(ExportArgs),

    /// Compare two snapshot files
    Diff(DiffArgs),
}

/// Arguments for the show subcommand
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Show a single task
    #[arg(long, value_name = "ID")]
    pub task: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_with_negative_coordinates() {
        let cli = Cli::try_parse_from(["task-board", "move", "t1", "-20", "35.5"]).unwrap();
        match cli.command {
            Command::Move { id, x, y } => {
                assert_eq!(id, "t1");
                assert_eq!(x, -20.0);
                assert_eq!(y, 35.5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["task-board", "show", "--file", "board.json", "--format", "json"])
            .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("board.json")));
        assert_eq!(cli.log, "2");
        assert!(matches!(
            cli.command,
            Command::Show(ShowArgs { format: OutputFormat::Json, .. })
        ));
    }
}
