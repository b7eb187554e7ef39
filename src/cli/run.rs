//! Carrying out CLI commands.
//!
//! Board commands open the configured snapshot, apply one change through the
//! same [`Board`] entry points the canvas uses, and flush before returning.

use super::diff::{DiffArgs, DiffFormat};
use super::export::ExportArgs;
use super::task::parse_point;
use super::{Command, ShowArgs};
use crate::board::Board;
use crate::config::Config;
use crate::diff::diff_snapshots;
use crate::format::{OutputFormat, format_board, format_task_markdown};
use crate::geometry::Point;
use crate::persist::{FileSink, SnapshotSink, load_store};
use crate::render::NullRenderer;
use crate::store::{Clock, Snapshot};
use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use tracing::info;

type CliBoard = Board<FileSink, NullRenderer>;

/// Run one command, writing user-facing output to `out`.
pub fn execute(command: &Command, config: &Config, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Show(args) => show(args, config, out),
        Command::Add(args) => {
            let fields = args.fields.to_fields(Some(&args.title))?;
            let at = args.at.as_deref().map(parse_point).transpose()?;
            let id = with_board(config, |board| {
                let id = match at {
                    Some(pos) => board.create_task_at(fields, pos)?,
                    None => board.create_task(fields)?,
                };
                Ok(id)
            })?;
            writeln!(out, "{}", id)?;
            Ok(())
        }
        Command::Edit(args) => {
            let fields = args.fields.to_fields(args.title.as_deref())?;
            if fields.is_empty() {
                bail!("nothing to change; pass at least one field flag");
            }
            with_board(config, |board| Ok(board.update_task(&args.id, fields)?))?;
            writeln!(out, "Updated {}", args.id)?;
            Ok(())
        }
        Command::Move { id, x, y } => {
            with_board(config, |board| Ok(board.move_node(id, Point::new(*x, *y))?))?;
            writeln!(out, "Moved {} to ({}, {})", id, x, y)?;
            Ok(())
        }
        Command::Remove { id } => {
            let removed = with_board(config, |board| Ok(board.delete_node(id)?))?;
            writeln!(out, "Removed {} ({} connections)", id, removed.len())?;
            Ok(())
        }
        Command::Connect { from, to } => {
            match with_board(config, |board| Ok(board.connect(from, to)?))? {
                Some(id) => writeln!(out, "{}", id)?,
                None => writeln!(out, "Already connected: {} -> {}", from, to)?,
            }
            Ok(())
        }
        Command::Disconnect { id } => {
            let record = with_board(config, |board| Ok(board.delete_connection(id)?))?;
            writeln!(out, "Removed connection {}: {} -> {}", record.id, record.from, record.to)?;
            Ok(())
        }
        Command::Export(args) => export(args, config, out),
        Command::Diff(args) => diff(args, out),
    }
}

fn with_board<T>(config: &Config, f: impl FnOnce(&mut CliBoard) -> Result<T>) -> Result<T> {
    let path = &config.storage.path;
    let mut board = Board::open(FileSink::new(path), config.board_options(), NullRenderer)?;
    let value = f(&mut board)?;
    board.flush();
    if board.persistence().failed_writes() > 0 {
        bail!("could not save {}", path.display());
    }
    Ok(value)
}

fn show(args: &ShowArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let mut sink = FileSink::new(&config.storage.path);
    let store = load_store(&mut sink, config.store_options(Clock::System)).store;

    match &args.task {
        Some(id) => {
            let task = store.task(id)?;
            match args.format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(task)?)?,
                OutputFormat::Markdown => write!(out, "{}", format_task_markdown(task, &store))?,
            }
        }
        None => write!(out, "{}", format_board(&store, args.format)?)?,
    }
    Ok(())
}

fn export(args: &ExportArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let mut sink = FileSink::new(&config.storage.path);
    let store = load_store(&mut sink, config.store_options(Clock::System)).store;
    let snapshot = store.serialize();
    let bytes = if args.compact {
        snapshot.to_json_compact()?
    } else {
        snapshot.to_json_pretty()?
    };

    match &args.output {
        Some(path) => {
            FileSink::new(path)
                .with_gzip(args.should_compress())
                .store(&bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(
                path = %path.display(),
                tasks = store.task_count(),
                connections = store.connection_count(),
                "exported board"
            );
        }
        None if args.should_compress() => {
            let mut encoder = GzEncoder::new(out, Compression::default());
            encoder.write_all(&bytes)?;
            encoder.finish()?;
        }
        None => out.write_all(&bytes)?,
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = FileSink::new(path)
        .load()
        .with_context(|| format!("reading {}", path.display()))?
        .with_context(|| format!("snapshot not found: {}", path.display()))?;
    let (snapshot, _) = Snapshot::parse_lenient(&bytes, Clock::System.today())
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(snapshot)
}

fn diff(args: &DiffArgs, out: &mut dyn Write) -> Result<()> {
    let source = read_snapshot(&args.source)?;
    let target = read_snapshot(&args.target)?;
    let diff = diff_snapshots(&source, &target).with_labels(
        args.source.display().to_string(),
        args.target.display().to_string(),
    );

    match args.format {
        DiffFormat::Text => write!(out, "{}", diff)?,
        DiffFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&diff)?)?,
        DiffFormat::Summary => {
            writeln!(
                out,
                "tasks: +{} -{} ~{}",
                diff.tasks.added.len(),
                diff.tasks.removed.len(),
                diff.tasks.modified.len()
            )?;
            writeln!(
                out,
                "connections: +{} -{}",
                diff.connections.added.len(),
                diff.connections.removed.len()
            )?;
        }
    }
    Ok(())
}
