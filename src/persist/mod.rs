//! Persistence adapter.
//!
//! Writes a full snapshot of the store to a [`SnapshotSink`] whenever the
//! graph changes, and reads one back at startup. A failed write is logged and
//! counted; the in-memory graph is never rolled back.

pub mod sink;

pub use sink::{FileSink, MemorySink, SnapshotSink};

use crate::events::{GraphEvent, MutationKind};
use crate::store::{GraphStore, LoadReport, Snapshot, StoreOptions};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// When writes happen after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Write during the same commit as the change.
    #[default]
    Immediate,
    /// Moves wait until no change has arrived for this long; any other change
    /// writes at once, taking pending moves with it.
    Debounced(Duration),
}

/// Subscriber that turns graph events into snapshot writes.
#[derive(Debug)]
pub struct Persistence<S: SnapshotSink> {
    sink: S,
    policy: WritePolicy,
    pretty: bool,
    dirty: bool,
    last_change: Option<Instant>,
    writes: u64,
    failed_writes: u64,
}

impl<S: SnapshotSink> Persistence<S> {
    pub fn new(sink: S, policy: WritePolicy) -> Self {
        Self {
            sink,
            policy,
            pretty: true,
            dirty: false,
            last_change: None,
            writes: 0,
            failed_writes: 0,
        }
    }

    /// Write compact JSON instead of indented.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Changes not yet written (or whose write failed).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn failed_writes(&self) -> u64 {
        self.failed_writes
    }

    /// React to committed events. Returns true if a write succeeded.
    pub fn notify(&mut self, events: &[GraphEvent], store: &GraphStore, now: Instant) -> bool {
        if events.is_empty() {
            return false;
        }
        self.dirty = true;
        self.last_change = Some(now);

        let moves_only = events.iter().all(|e| e.kind() == MutationKind::TaskMoved);
        debug!(
            events = events.len(),
            structural = events.iter().filter(|e| e.is_structural()).count(),
            "graph changed"
        );
        match self.policy {
            WritePolicy::Debounced(_) if moves_only => false,
            WritePolicy::Immediate | WritePolicy::Debounced(_) => self.write(store),
        }
    }

    /// Write if a debounced change has settled. Returns true if a write succeeded.
    pub fn flush_due(&mut self, store: &GraphStore, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        let due = match (self.policy, self.last_change) {
            (WritePolicy::Immediate, _) | (_, None) => true,
            (WritePolicy::Debounced(delay), Some(at)) => now.saturating_duration_since(at) >= delay,
        };
        due && self.write(store)
    }

    /// Write now if anything is pending.
    pub fn flush(&mut self, store: &GraphStore) -> bool {
        self.dirty && self.write(store)
    }

    /// Serialize the whole store and hand it to the sink.
    pub fn write(&mut self, store: &GraphStore) -> bool {
        let snapshot = store.serialize();
        let encoded = if self.pretty {
            snapshot.to_json_pretty()
        } else {
            snapshot.to_json_compact()
        };
        let result = encoded
            .map_err(PersistError::from)
            .and_then(|bytes| self.sink.store(&bytes));

        match result {
            Ok(()) => {
                self.writes += 1;
                self.dirty = false;
                debug!(
                    sink = %self.sink.describe(),
                    tasks = store.task_count(),
                    connections = store.connection_count(),
                    "snapshot written"
                );
                true
            }
            Err(e) => {
                self.failed_writes += 1;
                warn!(sink = %self.sink.describe(), error = %e, "snapshot write failed");
                false
            }
        }
    }
}

/// How a startup load went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Snapshot found and parsed.
    Loaded,
    /// Nothing stored yet.
    Missing,
    /// Stored bytes are not a snapshot.
    Malformed(String),
    /// The sink could not be read.
    Unreadable(String),
}

/// Result of [`load_store`].
#[derive(Debug)]
pub struct Loaded {
    pub store: GraphStore,
    pub report: LoadReport,
    pub status: LoadStatus,
}

/// Read the sink into a fresh store.
///
/// Never fails: a missing, unreadable or malformed snapshot yields an empty
/// store and the reason in [`Loaded::status`].
pub fn load_store<S: SnapshotSink>(sink: &mut S, options: StoreOptions) -> Loaded {
    let empty = |options: StoreOptions, status: LoadStatus| Loaded {
        store: GraphStore::new(options),
        report: LoadReport::default(),
        status,
    };

    let bytes = match sink.load() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            info!(source = %sink.describe(), "no saved tasks, starting with an empty board");
            return empty(options, LoadStatus::Missing);
        }
        Err(e) => {
            warn!(source = %sink.describe(), error = %e, "could not read saved tasks");
            return empty(options, LoadStatus::Unreadable(e.to_string()));
        }
    };

    let (snapshot, mut report) = match Snapshot::parse_lenient(&bytes, options.clock.today()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(source = %sink.describe(), error = %e, "saved tasks are malformed, starting empty");
            return empty(options, LoadStatus::Malformed(e.to_string()));
        }
    };

    let store = GraphStore::from_snapshot_into(snapshot, options, &mut report);

    if report.is_clean() {
        info!(
            source = %sink.describe(),
            tasks = report.tasks_loaded,
            connections = report.connections_loaded,
            "loaded saved tasks"
        );
    } else {
        warn!(
            source = %sink.describe(),
            tasks = report.tasks_loaded,
            connections = report.connections_loaded,
            dropped_tasks = report.dropped_tasks,
            dropped_connections = report.dropped_connections,
            defaulted_fields = report.defaulted_fields,
            "loaded saved tasks with repairs"
        );
    }

    Loaded {
        store,
        report,
        status: LoadStatus::Loaded,
    }
}
