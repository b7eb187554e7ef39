//! Snapshot format: the complete serialized state of a store.
//!
//! ```json
//! {
//!   "tasks": [{ "id": "...", "title": "...", "description": "...",
//!               "due_date": "YYYY-MM-DD", "created_date": "YYYY-MM-DD",
//!               "category": "Work", "color": "#ffc107", "pos": [20, 20] }],
//!   "connections": [{ "id": "...", "from": "<task id>", "to": "<task id>" }]
//! }
//! ```
//!
//! Loading is tolerant: individual malformed records are dropped or patched
//! with defaults instead of failing the whole file, and connections naming
//! absent tasks are dropped.

use super::{GraphStore, StoreOptions};
use crate::geometry::Point;
use crate::types::{
    Category, Color, ConnectionId, ConnectionRecord, FALLBACK_POSITION, TaskId, TaskRecord,
    parse_date,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Full state of a store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<TaskRecord>,
    pub connections: Vec<ConnectionRecord>,
}

impl Snapshot {
    /// Serialize with four-space indentation.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn to_json_compact(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse snapshot bytes, skipping records that cannot be read.
    ///
    /// `today` fills in a task that carries neither date. Fails only when the document itself is not a JSON object whose
    /// `tasks`/`connections` (each optional) are arrays.
    pub fn parse_lenient(
        bytes: &[u8],
        today: NaiveDate,
    ) -> Result<(Self, LoadReport), serde_json::Error> {
        let raw: RawSnapshot = serde_json::from_slice(bytes)?;
        let mut report = LoadReport::default();

        let mut tasks = Vec::with_capacity(raw.tasks.len());
        for value in raw.tasks {
            match read_task(value, today, &mut report) {
                Some(task) => tasks.push(task),
                None => report.dropped_tasks += 1,
            }
        }

        let mut connections = Vec::with_capacity(raw.connections.len());
        for value in raw.connections {
            match serde_json::from_value::<ConnectionRecord>(value) {
                Ok(connection) => connections.push(connection),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable connection");
                    report.dropped_connections += 1;
                }
            }
        }

        Ok((Self { tasks, connections }, report))
    }
}

/// What a load kept, dropped and patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub tasks_loaded: usize,
    pub connections_loaded: usize,
    /// Tasks that were unreadable, lacked an id or title, or repeated an id.
    pub dropped_tasks: usize,
    /// Connections that were unreadable, dangling or repeated a pair.
    pub dropped_connections: usize,
    /// Individual fields replaced by their default.
    pub defaulted_fields: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_tasks == 0 && self.dropped_connections == 0 && self.defaulted_fields == 0
    }
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    tasks: Vec<Value>,
    #[serde(default)]
    connections: Vec<Value>,
}

#[derive(Deserialize)]
struct RawTask {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    created_date: Option<String>,
    category: Option<String>,
    color: Option<String>,
    pos: Option<Value>,
}

fn read_task(value: Value, today: NaiveDate, report: &mut LoadReport) -> Option<TaskRecord> {
    let raw: RawTask = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "skipping unreadable task");
            return None;
        }
    };

    let id = match raw.id.filter(|id| !id.is_empty()) {
        Some(id) => TaskId::new(id),
        None => {
            warn!("skipping task without id");
            return None;
        }
    };
    let title = match raw.title.filter(|t| !t.trim().is_empty()) {
        Some(title) => title,
        None => {
            warn!(task_id = %id, "skipping task without title");
            return None;
        }
    };

    let mut defaulted = 0;
    let mut fallback = |field: &str| {
        debug!(task_id = %id, field, "defaulting field");
        defaulted += 1;
    };

    let created_date = match raw.created_date.as_deref().map(|s| parse_date("created_date", s)) {
        Some(Ok(date)) => Some(date),
        _ => {
            fallback("created_date");
            None
        }
    };
    let due_date = match raw.due_date.as_deref().map(|s| parse_date("due_date", s)) {
        Some(Ok(date)) => Some(date),
        _ => {
            fallback("due_date");
            None
        }
    };
    let category = match raw.category.as_deref().map(str::parse::<Category>) {
        Some(Ok(category)) => category,
        _ => {
            fallback("category");
            Category::default()
        }
    };
    let color = match raw.color.as_deref().map(Color::parse) {
        Some(Ok(color)) => color,
        _ => {
            fallback("color");
            Color::default()
        }
    };
    let pos = match raw.pos.map(serde_json::from_value::<[f64; 2]>) {
        Some(Ok(pair)) => Point::from(pair),
        _ => {
            fallback("pos");
            FALLBACK_POSITION
        }
    };
    let description = raw.description.unwrap_or_default();

    report.defaulted_fields += defaulted;

    // A task missing both dates borrows today's; one missing a single date
    // borrows the other so the pair stays plausible.
    let created_date = created_date.or(due_date).unwrap_or(today);
    let due_date = due_date.unwrap_or(created_date);

    Some(TaskRecord {
        id,
        title,
        description,
        due_date,
        created_date,
        category,
        color,
        pos,
    })
}

impl GraphStore {
    /// Full snapshot in insertion order.
    pub fn serialize(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks().to_vec(),
            connections: self.connections().to_vec(),
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Repeated task ids keep the first occurrence. Connections are kept only
    /// when both endpoints exist and the pair is new; self-loops follow
    /// `options.allow_self_loops`. No events are queued.
    pub fn deserialize(snapshot: Snapshot, options: StoreOptions) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let store = Self::from_snapshot_into(snapshot, options, &mut report);
        (store, report)
    }

    /// Like [`GraphStore::deserialize`], adding to an existing report.
    pub(crate) fn from_snapshot_into(
        snapshot: Snapshot,
        options: StoreOptions,
        report: &mut LoadReport,
    ) -> Self {
        let allow_self_loops = options.allow_self_loops;
        let mut store = GraphStore::new(options);

        for task in snapshot.tasks {
            if store.contains_task(task.id.as_str()) {
                warn!(task_id = %task.id, "dropping task with repeated id");
                report.dropped_tasks += 1;
                continue;
            }
            store.insert_task(task);
        }

        let mut seen: HashSet<ConnectionId> = HashSet::new();
        for connection in snapshot.connections {
            let keep = if !store.contains_task(connection.from.as_str())
                || !store.contains_task(connection.to.as_str())
            {
                warn!(
                    connection_id = %connection.id,
                    from = %connection.from,
                    to = %connection.to,
                    "dropping connection to missing task"
                );
                false
            } else if connection.is_self_loop() && !allow_self_loops {
                warn!(connection_id = %connection.id, "dropping self-loop connection");
                false
            } else if store.has_pair(&connection.from, &connection.to)
                || !seen.insert(connection.id.clone())
            {
                warn!(connection_id = %connection.id, "dropping repeated connection");
                false
            } else {
                true
            };

            if keep {
                store.insert_connection(connection);
            } else {
                report.dropped_connections += 1;
            }
        }

        report.tasks_loaded = store.task_count();
        report.connections_loaded = store.connection_count();
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ids::IdStyle;
    use crate::types::TaskFields;
    use serde_json::json;

    fn pi_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn sequential() -> StoreOptions {
        StoreOptions {
            id_style: IdStyle::Sequential,
            ..StoreOptions::default()
        }
    }

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let mut store = GraphStore::new(sequential());
        let a = store.add_task(TaskFields::titled("Write outline")).unwrap();
        let b = store.add_task(TaskFields::titled("Review")).unwrap();
        store.add_connection(a.as_str(), b.as_str()).unwrap();

        let snapshot = store.serialize();
        let ids: Vec<&str> = snapshot.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(snapshot.connections[0].from.as_str(), "t1");
        assert_eq!(snapshot.connections[0].to.as_str(), "t2");
    }

    #[test]
    fn test_pretty_output_uses_four_spaces() {
        let mut store = GraphStore::new(sequential());
        store.add_task(TaskFields::titled("A")).unwrap();
        let text = String::from_utf8(store.serialize().to_json_pretty().unwrap()).unwrap();
        assert!(text.contains("\n    \"tasks\": ["));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_dangling_connection_is_dropped() {
        let data = json!({
            "tasks": [
                { "id": "a", "title": "A", "description": "", "due_date": "2026-01-02",
                  "created_date": "2026-01-01", "category": "Work", "color": "#ffc107", "pos": [0, 0] },
                { "id": "b", "title": "B", "description": "", "due_date": "2026-01-02",
                  "created_date": "2026-01-01", "category": "Other", "color": "#00ff00", "pos": [300, 0] }
            ],
            "connections": [
                { "id": "c1", "from": "a", "to": "b" },
                { "id": "c2", "from": "a", "to": "zzz" }
            ]
        });
        let (snapshot, mut report) =
            Snapshot::parse_lenient(data.to_string().as_bytes(), pi_day()).unwrap();
        let store = GraphStore::from_snapshot_into(snapshot, sequential(), &mut report);

        assert_eq!(store.task_count(), 2);
        assert_eq!(store.connection_count(), 1);
        assert!(store.contains_connection("c1"));
        assert_eq!(report.dropped_connections, 1);
        assert_eq!(report.tasks_loaded, 2);
    }

    #[test]
    fn test_partial_task_gets_defaults() {
        let data = json!({
            "tasks": [{ "id": "a", "title": "Only a title" }],
            "connections": []
        });
        let (snapshot, report) = Snapshot::parse_lenient(data.to_string().as_bytes(), pi_day()).unwrap();
        let task = &snapshot.tasks[0];
        assert_eq!(task.category, Category::Work);
        assert_eq!(task.color, Color::default());
        assert_eq!(task.pos, FALLBACK_POSITION);
        assert_eq!(task.due_date, task.created_date);
        assert_eq!(report.defaulted_fields, 5);
    }

    #[test]
    fn test_undated_task_takes_given_today() {
        let data = json!({
            "tasks": [
                { "id": "a", "title": "Undated" },
                { "id": "b", "title": "Due only", "due_date": "2026-05-01" }
            ]
        });
        let (snapshot, _) = Snapshot::parse_lenient(data.to_string().as_bytes(), pi_day()).unwrap();
        assert_eq!(snapshot.tasks[0].created_date, pi_day());
        assert_eq!(snapshot.tasks[0].due_date, pi_day());
        let due = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert_eq!(snapshot.tasks[1].created_date, due);
        assert_eq!(snapshot.tasks[1].due_date, due);
    }

    #[test]
    fn test_unreadable_tasks_are_dropped() {
        let data = json!({
            "tasks": [
                { "title": "no id" },
                { "id": "x" },
                "not an object",
                { "id": "ok", "title": "Fine" }
            ]
        });
        let (snapshot, report) = Snapshot::parse_lenient(data.to_string().as_bytes(), pi_day()).unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(report.dropped_tasks, 3);
    }

    #[test]
    fn test_non_object_document_is_an_error() {
        assert!(Snapshot::parse_lenient(b"[1, 2, 3]", pi_day()).is_err());
        assert!(Snapshot::parse_lenient(b"{ \"tasks\": 5 }", pi_day()).is_err());
        assert!(Snapshot::parse_lenient(b"not json", pi_day()).is_err());
    }

    #[test]
    fn test_repeated_ids_and_pairs_are_dropped() {
        let mut source = GraphStore::new(sequential());
        let a = source.add_task(TaskFields::titled("A")).unwrap();
        let b = source.add_task(TaskFields::titled("B")).unwrap();
        source.add_connection(a.as_str(), b.as_str()).unwrap();

        let mut snapshot = source.serialize();
        snapshot.tasks.push(snapshot.tasks[0].clone());
        let mut twin = snapshot.connections[0].clone();
        twin.id = ConnectionId::from("c99");
        snapshot.connections.push(twin);

        let (store, report) = GraphStore::deserialize(snapshot, sequential());
        assert_eq!(store.task_count(), 2);
        assert_eq!(store.connection_count(), 1);
        assert_eq!(report.dropped_tasks, 1);
        assert_eq!(report.dropped_connections, 1);
    }

    #[test]
    fn test_loaded_store_continues_sequence() {
        let mut source = GraphStore::new(sequential());
        source.add_task(TaskFields::titled("A")).unwrap();
        source.add_task(TaskFields::titled("B")).unwrap();

        let (mut store, _) = GraphStore::deserialize(source.serialize(), sequential());
        let next = store.add_task(TaskFields::titled("C")).unwrap();
        assert_eq!(next.as_str(), "t3");
    }
}
