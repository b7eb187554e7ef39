//! Comparing two board snapshots.
//!
//! Tasks are matched by id. Connections are matched by their directed
//! `(from, to)` pair, so a connection recreated under a new id is not
//! reported as a change.

use crate::store::Snapshot;
use crate::types::{ConnectionRecord, TaskRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single field change within a task.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// A task present on both sides with different fields.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModifiedTask {
    pub id: String,
    pub title: String,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct TaskDiff {
    pub added: Vec<TaskRecord>,
    pub removed: Vec<TaskRecord>,
    pub modified: Vec<ModifiedTask>,
}

impl TaskDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ConnectionDiff {
    pub added: Vec<ConnectionRecord>,
    pub removed: Vec<ConnectionRecord>,
}

impl ConnectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Complete diff between two snapshots.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SnapshotDiff {
    pub source_label: String,
    pub target_label: String,
    pub tasks: TaskDiff,
    pub connections: ConnectionDiff,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.connections.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.tasks.change_count() + self.connections.change_count()
    }

    /// Label both sides for display.
    pub fn with_labels(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_label = source.into();
        self.target_label = target.into();
        self
    }
}

impl fmt::Display for SnapshotDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "No differences found.")?;
            return Ok(());
        }

        writeln!(f, "Diff: {} -> {}", self.source_label, self.target_label)?;
        writeln!(f, "{}", "=".repeat(60))?;

        if !self.tasks.is_empty() {
            writeln!(f)?;
            writeln!(f, "Tasks")?;
            writeln!(f, "{}", "-".repeat(40))?;
            if !self.tasks.added.is_empty() {
                writeln!(f, "  Added ({}):", self.tasks.added.len())?;
                for task in &self.tasks.added {
                    writeln!(f, "    + {}", brief(task.id.as_str(), &task.title))?;
                }
            }
            if !self.tasks.removed.is_empty() {
                writeln!(f, "  Removed ({}):", self.tasks.removed.len())?;
                for task in &self.tasks.removed {
                    writeln!(f, "    - {}", brief(task.id.as_str(), &task.title))?;
                }
            }
            if !self.tasks.modified.is_empty() {
                writeln!(f, "  Modified ({}):", self.tasks.modified.len())?;
                for modified in &self.tasks.modified {
                    writeln!(f, "    ~ {}", brief(&modified.id, &modified.title))?;
                    for change in &modified.changes {
                        writeln!(
                            f,
                            "        {}: {} -> {}",
                            change.field, change.old_value, change.new_value
                        )?;
                    }
                }
            }
        }

        if !self.connections.is_empty() {
            writeln!(f)?;
            writeln!(f, "Connections")?;
            writeln!(f, "{}", "-".repeat(40))?;
            if !self.connections.added.is_empty() {
                writeln!(f, "  Added ({}):", self.connections.added.len())?;
                for c in &self.connections.added {
                    writeln!(f, "    + {} -> {}", c.from, c.to)?;
                }
            }
            if !self.connections.removed.is_empty() {
                writeln!(f, "  Removed ({}):", self.connections.removed.len())?;
                for c in &self.connections.removed {
                    writeln!(f, "    - {} -> {}", c.from, c.to)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Summary: {} total changes", self.total_changes())?;
        Ok(())
    }
}

fn brief(id: &str, title: &str) -> String {
    if title.chars().count() > 40 {
        let short: String = title.chars().take(37).collect();
        format!("{id} ({short}...)")
    } else {
        format!("{id} ({title})")
    }
}

/// Compare numbers with a tolerance so re-serialized positions match.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => match (na.as_f64(), nb.as_f64()) {
            (Some(fa), Some(fb)) => (fa - fb).abs() < 1e-10,
            _ => na == nb,
        },
        (Value::Array(xa), Value::Array(xb)) => {
            xa.len() == xb.len() && xa.iter().zip(xb).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn diff_tasks(source: &TaskRecord, target: &TaskRecord) -> Vec<FieldChange> {
    let (Ok(Value::Object(src)), Ok(Value::Object(tgt))) =
        (serde_json::to_value(source), serde_json::to_value(target))
    else {
        return Vec::new();
    };

    let fields: BTreeSet<&str> = src.keys().chain(tgt.keys()).map(String::as_str).collect();
    fields
        .into_iter()
        .filter(|field| *field != "id")
        .filter_map(|field| {
            let old = src.get(field).unwrap_or(&Value::Null);
            let new = tgt.get(field).unwrap_or(&Value::Null);
            (!values_equal(old, new)).then(|| FieldChange {
                field: field.to_string(),
                old_value: old.clone(),
                new_value: new.clone(),
            })
        })
        .collect()
}

/// Compare two snapshots.
///
/// "added" means present in `target` only, "removed" present in `source` only.
pub fn diff_snapshots(source: &Snapshot, target: &Snapshot) -> SnapshotDiff {
    let mut result = SnapshotDiff {
        source_label: "source".to_string(),
        target_label: "target".to_string(),
        ..SnapshotDiff::default()
    };

    let source_tasks: BTreeMap<&str, &TaskRecord> =
        source.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let target_tasks: BTreeMap<&str, &TaskRecord> =
        target.tasks.iter().map(|t| (t.id.as_str(), t)).collect();

    for (id, task) in &target_tasks {
        if !source_tasks.contains_key(id) {
            result.tasks.added.push((*task).clone());
        }
    }
    for (id, task) in &source_tasks {
        match target_tasks.get(id) {
            None => result.tasks.removed.push((*task).clone()),
            Some(other) => {
                let changes = diff_tasks(task, other);
                if !changes.is_empty() {
                    result.tasks.modified.push(ModifiedTask {
                        id: id.to_string(),
                        title: other.title.clone(),
                        changes,
                    });
                }
            }
        }
    }

    let pair = |c: &ConnectionRecord| (c.from.as_str().to_string(), c.to.as_str().to_string());
    let source_pairs: BTreeMap<_, &ConnectionRecord> =
        source.connections.iter().map(|c| (pair(c), c)).collect();
    let target_pairs: BTreeMap<_, &ConnectionRecord> =
        target.connections.iter().map(|c| (pair(c), c)).collect();

    for (key, connection) in &target_pairs {
        if !source_pairs.contains_key(key) {
            result.connections.added.push((*connection).clone());
        }
    }
    for (key, connection) in &source_pairs {
        if !target_pairs.contains_key(key) {
            result.connections.removed.push((*connection).clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphStore, StoreOptions};
    use crate::store::ids::IdStyle;
    use crate::types::{Category, TaskFields};
    use crate::geometry::Point;
    use serde_json::json;

    fn setup_store() -> GraphStore {
        let mut store = GraphStore::new(StoreOptions {
            id_style: IdStyle::Sequential,
            ..StoreOptions::default()
        });
        let a = store.add_task(TaskFields::titled("Write report")).unwrap();
        let b = store.add_task(TaskFields::titled("Send report")).unwrap();
        store.add_connection(a.as_str(), b.as_str()).unwrap();
        store
    }

    #[test]
    fn test_identical_snapshots() {
        let store = setup_store();
        let diff = diff_snapshots(&store.serialize(), &store.serialize());
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "No differences found.\n");
    }

    #[test]
    fn test_field_changes() {
        let mut store = setup_store();
        let before = store.serialize();
        store
            .update_task("t1", TaskFields::default().with_category(Category::Urgent))
            .unwrap();
        store.move_task("t1", Point::new(40.0, 60.0)).unwrap();

        let diff = diff_snapshots(&before, &store.serialize());

        assert_eq!(diff.tasks.modified.len(), 1);
        let fields: Vec<&str> = diff.tasks.modified[0]
            .changes
            .iter()
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(fields, vec!["category", "pos"]);
        assert_eq!(diff.tasks.modified[0].changes[0].new_value, json!("Urgent"));
    }

    #[test]
    fn test_added_removed() {
        let mut store = setup_store();
        let before = store.serialize();
        store.remove_task("t2").unwrap();
        store.add_task(TaskFields::titled("File report")).unwrap();

        let diff = diff_snapshots(&before, &store.serialize()).with_labels("old.json", "new.json");

        assert_eq!(diff.tasks.added.len(), 1);
        assert_eq!(diff.tasks.removed.len(), 1);
        assert_eq!(diff.connections.removed.len(), 1);
        assert_eq!(diff.total_changes(), 3);

        let text = diff.to_string();
        assert!(text.contains("Diff: old.json -> new.json"));
        assert!(text.contains("    - t1 -> t2"));
        assert!(text.contains("Summary: 3 total changes"));
    }

    #[test]
    fn test_recreated_connection_is_unchanged() {
        let mut store = setup_store();
        let before = store.serialize();
        let c1 = store.find_connection("t1", "t2").unwrap().id.clone();
        store.remove_connection(c1.as_str()).unwrap();
        store.add_connection("t1", "t2").unwrap();

        let diff = diff_snapshots(&before, &store.serialize());
        assert!(diff.connections.is_empty());
    }
}
