//! Change notifications emitted by the graph store.
//!
//! Every successful store mutation records one [`GraphEvent`]. The board drains
//! them after each gesture and hands them to the persistence subscriber and the
//! renderer, so neither the store nor the controllers decide when to write.

use crate::types::{ConnectionId, TaskId};

/// Categories of mutations, coarse enough for write-policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// A task was created, edited or deleted.
    TaskChanged,
    /// Only a task position changed (drag).
    TaskMoved,
    /// A connection was created or removed.
    ConnectionChanged,
}

/// A single committed change to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    TaskAdded(TaskId),
    TaskUpdated(TaskId),
    TaskMoved(TaskId),
    /// A task and the connections that were cascaded with it.
    TaskRemoved {
        task: TaskId,
        connections: Vec<ConnectionId>,
    },
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
}

impl GraphEvent {
    pub fn kind(&self) -> MutationKind {
        match self {
            GraphEvent::TaskAdded(_) | GraphEvent::TaskUpdated(_) | GraphEvent::TaskRemoved { .. } => {
                MutationKind::TaskChanged
            }
            GraphEvent::TaskMoved(_) => MutationKind::TaskMoved,
            GraphEvent::ConnectionAdded(_) | GraphEvent::ConnectionRemoved(_) => {
                MutationKind::ConnectionChanged
            }
        }
    }

    /// True for changes that add or remove records.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphEvent::TaskAdded(_)
                | GraphEvent::TaskRemoved { .. }
                | GraphEvent::ConnectionAdded(_)
                | GraphEvent::ConnectionRemoved(_)
        )
    }
}

/// Buffer of events not yet seen by subscribers.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    pending: Vec<GraphEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GraphEvent) {
        self.pending.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            GraphEvent::TaskMoved(TaskId::from("t1")).kind(),
            MutationKind::TaskMoved
        );
        assert_eq!(
            GraphEvent::ConnectionAdded(ConnectionId::from("c1")).kind(),
            MutationKind::ConnectionChanged
        );
        assert!(!GraphEvent::TaskMoved(TaskId::from("t1")).is_structural());
        assert!(!GraphEvent::TaskUpdated(TaskId::from("t1")).is_structural());
        assert!(
            GraphEvent::TaskRemoved {
                task: TaskId::from("t1"),
                connections: vec![],
            }
            .is_structural()
        );
    }

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = EventQueue::new();
        queue.push(GraphEvent::TaskAdded(TaskId::from("t1")));
        queue.push(GraphEvent::TaskMoved(TaskId::from("t1")));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], GraphEvent::TaskAdded(TaskId::from("t1")));
        assert!(queue.is_empty());
    }
}
