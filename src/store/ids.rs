//! Id generation for tasks and connections.

use crate::types::{ConnectionId, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How fresh ids are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStyle {
    /// Random UUIDv4 strings.
    #[default]
    Uuid,
    /// Short counters: `t1`, `t2`, ... for tasks and `c1`, `c2`, ... for connections.
    Sequential,
}

impl IdStyle {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uuid" => Some(IdStyle::Uuid),
            "sequential" | "seq" => Some(IdStyle::Sequential),
            _ => None,
        }
    }
}

const TASK_PREFIX: &str = "t";
const CONNECTION_PREFIX: &str = "c";

/// Mints ids. Sequential counters only move forward and skip past any id
/// observed from a loaded snapshot, so a reloaded board keeps counting.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    style: IdStyle,
    next_task: u64,
    next_connection: u64,
}

impl IdGenerator {
    pub fn new(style: IdStyle) -> Self {
        Self {
            style,
            next_task: 1,
            next_connection: 1,
        }
    }

    pub fn style(&self) -> IdStyle {
        self.style
    }

    pub fn next_task_id(&mut self) -> TaskId {
        match self.style {
            IdStyle::Uuid => TaskId::new(Uuid::new_v4().to_string()),
            IdStyle::Sequential => {
                let id = format!("{}{}", TASK_PREFIX, self.next_task);
                self.next_task = self.next_task.saturating_add(1);
                TaskId::new(id)
            }
        }
    }

    pub fn next_connection_id(&mut self) -> ConnectionId {
        match self.style {
            IdStyle::Uuid => ConnectionId::new(Uuid::new_v4().to_string()),
            IdStyle::Sequential => {
                let id = format!("{}{}", CONNECTION_PREFIX, self.next_connection);
                self.next_connection = self.next_connection.saturating_add(1);
                ConnectionId::new(id)
            }
        }
    }

    /// Record an existing task id so sequential minting never reissues it.
    pub fn observe_task(&mut self, id: &TaskId) {
        if let Some(n) = counter_of(id.as_str(), TASK_PREFIX) {
            self.next_task = self.next_task.max(n.saturating_add(1));
        }
    }

    /// Record an existing connection id.
    pub fn observe_connection(&mut self, id: &ConnectionId) {
        if let Some(n) = counter_of(id.as_str(), CONNECTION_PREFIX) {
            self.next_connection = self.next_connection.max(n.saturating_add(1));
        }
    }
}

fn counter_of(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.parse().ok()
}
