//! `diff` subcommand arguments.

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Compare two snapshot files
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Older snapshot (plain or gzip)
    #[arg(value_name = "FILE")]
    pub source: PathBuf,

    /// Newer snapshot (plain or gzip)
    #[arg(value_name = "FILE")]
    pub target: PathBuf,

    #[arg(short = 'F', long, value_enum, ignore_case = true, default_value_t = DiffFormat::Text)]
    pub format: DiffFormat,
}

/// How a diff is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DiffFormat {
    /// Sectioned report with per-field changes
    #[default]
    Text,
    /// The full diff as JSON
    Json,
    /// One count line for tasks and one for connections
    Summary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn parse(args: &[&str]) -> DiffArgs {
        let argv: Vec<&str> = ["task-board", "diff"]
            .into_iter()
            .chain(args.iter().copied())
            .collect();
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Diff(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_format_defaults_to_text() {
        let args = parse(&["a.json", "b.json.gz"]);
        assert_eq!(args.format, DiffFormat::Text);
        assert_eq!(args.target, PathBuf::from("b.json.gz"));
    }

    #[test]
    fn test_format_flag_ignores_case() {
        assert_eq!(parse(&["a", "b", "-F", "SUMMARY"]).format, DiffFormat::Summary);
        assert_eq!(parse(&["a", "b", "--format", "json"]).format, DiffFormat::Json);
        assert!(Cli::try_parse_from(["task-board", "diff", "a", "b", "-F", "yaml"]).is_err());
    }
}
