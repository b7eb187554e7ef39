//! Graph store: the authoritative task and connection collections.
//!
//! The store is an arena keyed by id. Controllers and connections refer to
//! tasks by id only, and every structural change goes through the methods
//! below, which keep two invariants at all times:
//! - every connection names two tasks that are present;
//! - no two connections share a `(from, to)` pair.
//!
//! Each successful mutation queues a [`GraphEvent`]; nothing here touches disk.

pub mod ids;
pub mod snapshot;

use crate::error::{GraphError, GraphResult};
use crate::events::{EventQueue, GraphEvent};
use crate::geometry::Point;
use crate::types::{Color, ConnectionId, ConnectionRecord, TaskFields, TaskId, TaskRecord};
use chrono::NaiveDate;
use ids::{IdGenerator, IdStyle};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub use snapshot::{LoadReport, Snapshot};

/// Source of "today" for `created_date` and default due dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Local calendar date.
    #[default]
    System,
    /// A pinned date, for reproducible runs.
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => chrono::Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Behavioural knobs for a store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub id_style: IdStyle,
    pub allow_self_loops: bool,
    pub new_task_position: Point,
    pub clock: Clock,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            id_style: IdStyle::default(),
            allow_self_loops: false,
            new_task_position: Point::new(20.0, 20.0),
            clock: Clock::default(),
        }
    }
}

/// Owns every task and connection record.
#[derive(Debug, Clone)]
pub struct GraphStore {
    tasks: Vec<TaskRecord>,
    task_index: HashMap<TaskId, usize>,
    connections: Vec<ConnectionRecord>,
    connection_index: HashMap<ConnectionId, usize>,
    pairs: HashSet<(TaskId, TaskId)>,
    ids: IdGenerator,
    options: StoreOptions,
    events: EventQueue,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl GraphStore {
    /// Create an empty store.
    pub fn new(options: StoreOptions) -> Self {
        Self {
            tasks: Vec::new(),
            task_index: HashMap::new(),
            connections: Vec::new(),
            connection_index: HashMap::new(),
            pairs: HashSet::new(),
            ids: IdGenerator::new(options.id_style),
            options,
            events: EventQueue::new(),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Create a task at the configured default position.
    pub fn add_task(&mut self, fields: TaskFields) -> GraphResult<TaskId> {
        let pos = self.options.new_task_position;
        self.add_task_at(fields, pos)
    }

    /// Create a task at `pos`. The title is required; every other field
    /// falls back to its default. `created_date` is set to today.
    pub fn add_task_at(&mut self, fields: TaskFields, pos: Point) -> GraphResult<TaskId> {
        fields.validate()?;
        let TaskFields {
            title,
            description,
            due_date,
            category,
            color,
        } = fields;
        let title = title.ok_or_else(|| GraphError::missing_field("title"))?;

        let id = self.ids.next_task_id();
        if self.task_index.contains_key(&id) {
            return Err(GraphError::duplicate_id(id.as_str()));
        }

        let today = self.options.clock.today();
        let record = TaskRecord {
            id: id.clone(),
            title,
            description: description.unwrap_or_default(),
            due_date: due_date.unwrap_or(today),
            created_date: today,
            category: category.unwrap_or_default(),
            color: color.unwrap_or_else(Color::default),
            pos,
        };

        debug!(task_id = %id, title = %record.title, "task added");
        self.insert_task(record);
        self.events.push(GraphEvent::TaskAdded(id.clone()));
        Ok(id)
    }

    /// Merge `fields` into an existing task.
    pub fn update_task(&mut self, id: &str, fields: TaskFields) -> GraphResult<()> {
        fields.validate()?;
        let record = self.task_mut(id)?;
        record.apply(fields);
        let id = record.id.clone();

        debug!(task_id = %id, "task updated");
        self.events.push(GraphEvent::TaskUpdated(id));
        Ok(())
    }

    /// Set a task's position.
    pub fn move_task(&mut self, id: &str, pos: Point) -> GraphResult<()> {
        let record = self.task_mut(id)?;
        record.pos = pos;
        let id = record.id.clone();
        self.events.push(GraphEvent::TaskMoved(id));
        Ok(())
    }

    /// Remove a task together with every connection that names it.
    ///
    /// Connections go first, so there is no point at which one dangles.
    /// Returns the removed connection ids.
    pub fn remove_task(&mut self, id: &str) -> GraphResult<Vec<ConnectionId>> {
        let idx = *self
            .task_index
            .get(id)
            .ok_or_else(|| GraphError::task_not_found(id))?;

        let cascaded: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|c| c.touches(id))
            .map(|c| c.id.clone())
            .collect();
        for connection_id in &cascaded {
            self.take_connection(connection_id.as_str());
        }

        let record = self.tasks.remove(idx);
        self.task_index.remove(&record.id);
        self.reindex_tasks(idx);

        debug!(task_id = %record.id, cascaded = cascaded.len(), "task removed");
        self.events.push(GraphEvent::TaskRemoved {
            task: record.id,
            connections: cascaded.clone(),
        });
        Ok(cascaded)
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Link `from` to `to`.
    ///
    /// Returns `Ok(None)` without changing anything when that directed pair
    /// already exists. Both tasks must be present.
    pub fn add_connection(&mut self, from: &str, to: &str) -> GraphResult<Option<ConnectionId>> {
        let from = self.task(from)?.id.clone();
        let to = self.task(to)?.id.clone();

        if from == to && !self.options.allow_self_loops {
            return Err(GraphError::self_loop(from.as_str()));
        }
        if self.pairs.contains(&(from.clone(), to.clone())) {
            debug!(from = %from, to = %to, "connection already exists");
            return Ok(None);
        }

        let id = self.ids.next_connection_id();
        if self.connection_index.contains_key(&id) {
            return Err(GraphError::duplicate_id(id.as_str()));
        }

        debug!(connection_id = %id, from = %from, to = %to, "connection added");
        self.insert_connection(ConnectionRecord {
            id: id.clone(),
            from,
            to,
        });
        self.events.push(GraphEvent::ConnectionAdded(id.clone()));
        Ok(Some(id))
    }

    /// Remove one connection, returning its record.
    pub fn remove_connection(&mut self, id: &str) -> GraphResult<ConnectionRecord> {
        let record = self
            .take_connection(id)
            .ok_or_else(|| GraphError::connection_not_found(id))?;

        debug!(connection_id = %record.id, "connection removed");
        self.events
            .push(GraphEvent::ConnectionRemoved(record.id.clone()));
        Ok(record)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn task(&self, id: &str) -> GraphResult<&TaskRecord> {
        self.task_index
            .get(id)
            .map(|&idx| &self.tasks[idx])
            .ok_or_else(|| GraphError::task_not_found(id))
    }

    pub fn connection(&self, id: &str) -> GraphResult<&ConnectionRecord> {
        self.connection_index
            .get(id)
            .map(|&idx| &self.connections[idx])
            .ok_or_else(|| GraphError::connection_not_found(id))
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.task_index.contains_key(id)
    }

    pub fn contains_connection(&self, id: &str) -> bool {
        self.connection_index.contains_key(id)
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> &[ConnectionRecord] {
        &self.connections
    }

    /// Connections with `task_id` at either end.
    pub fn connections_of<'a>(
        &'a self,
        task_id: &'a str,
    ) -> impl Iterator<Item = &'a ConnectionRecord> + 'a {
        self.connections.iter().filter(move |c| c.touches(task_id))
    }

    /// The connection for a directed pair, if any.
    pub fn find_connection(&self, from: &str, to: &str) -> Option<&ConnectionRecord> {
        self.connections
            .iter()
            .find(|c| c.from.as_str() == from && c.to.as_str() == to)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.connections.is_empty()
    }

    /// Take the events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.events.drain()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn task_mut(&mut self, id: &str) -> GraphResult<&mut TaskRecord> {
        match self.task_index.get(id) {
            Some(&idx) => Ok(&mut self.tasks[idx]),
            None => Err(GraphError::task_not_found(id)),
        }
    }

    /// Append a task without validation or events. Used by creation and load.
    pub(crate) fn insert_task(&mut self, record: TaskRecord) {
        self.ids.observe_task(&record.id);
        self.task_index
            .insert(record.id.clone(), self.tasks.len());
        self.tasks.push(record);
    }

    /// Append a connection without validation or events. Callers have
    /// already checked both endpoints and the pair.
    pub(crate) fn insert_connection(&mut self, record: ConnectionRecord) {
        self.ids.observe_connection(&record.id);
        self.pairs
            .insert((record.from.clone(), record.to.clone()));
        self.connection_index
            .insert(record.id.clone(), self.connections.len());
        self.connections.push(record);
    }

    fn take_connection(&mut self, id: &str) -> Option<ConnectionRecord> {
        let idx = self.connection_index.remove(id)?;
        let record = self.connections.remove(idx);
        self.pairs
            .remove(&(record.from.clone(), record.to.clone()));
        self.reindex_connections(idx);
        Some(record)
    }

    fn reindex_tasks(&mut self, from: usize) {
        for (idx, record) in self.tasks.iter().enumerate().skip(from) {
            self.task_index.insert(record.id.clone(), idx);
        }
    }

    fn reindex_connections(&mut self, from: usize) {
        for (idx, record) in self.connections.iter().enumerate().skip(from) {
            self.connection_index.insert(record.id.clone(), idx);
        }
    }

    pub(crate) fn has_pair(&self, from: &TaskId, to: &TaskId) -> bool {
        self.pairs.contains(&(from.clone(), to.clone()))
    }
}
