//! Node controller: one task card plus its transient interaction state.

use super::connection::ConnectionController;
use crate::dialog::{DialogOutcome, EditorDialog};
use crate::error::GraphResult;
use crate::geometry::{Point, Rect, Size};
use crate::store::GraphStore;
use crate::types::{ConnectionId, TaskId};
use std::collections::HashMap;
use tracing::debug;

/// What came out of an editor session on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResult {
    /// Fields were merged into the task.
    Updated,
    /// The user asked for the task to be deleted; the caller removes the node.
    DeleteRequested,
    /// Dialog dismissed, nothing changed.
    Unchanged,
}

/// Wraps a task by id. Holds selection flags and the ids of the connections
/// drawn to or from it; the record itself stays in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeController {
    task_id: TaskId,
    selected: bool,
    pending_source: bool,
    connections: Vec<ConnectionId>,
}

impl NodeController {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            selected: false,
            pending_source: false,
            connections: Vec::new(),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Marked as the source of a connection being drawn.
    pub fn is_pending_source(&self) -> bool {
        self.pending_source
    }

    pub(crate) fn set_pending_source(&mut self, pending: bool) {
        self.pending_source = pending;
    }

    /// Connections currently attached, in attach order.
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    /// Returns false if the connection was already attached.
    pub fn attach_connection(&mut self, id: ConnectionId) -> bool {
        if self.connections.contains(&id) {
            return false;
        }
        self.connections.push(id);
        true
    }

    /// Returns false if the connection was not attached.
    pub fn detach_connection(&mut self, id: &str) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.as_str() != id);
        self.connections.len() != before
    }

    /// Bounding box at the task's current position.
    pub fn bounds(&self, store: &GraphStore, size: Size) -> GraphResult<Rect> {
        Ok(Rect::new(store.task(self.task_id.as_str())?.pos, size))
    }

    /// Move the task and bring every attached connection's line up to date.
    pub fn move_to(
        &self,
        store: &mut GraphStore,
        connections: &mut HashMap<ConnectionId, ConnectionController>,
        pos: Point,
        node_size: Size,
    ) -> GraphResult<()> {
        store.move_task(self.task_id.as_str(), pos)?;
        for id in &self.connections {
            if let Some(connection) = connections.get_mut(id) {
                connection.recompute_geometry(store, node_size)?;
            }
        }
        Ok(())
    }

    /// Run the editor dialog on this task's current fields and apply a save.
    pub fn open_editor(
        &self,
        store: &mut GraphStore,
        dialog: &mut dyn EditorDialog,
    ) -> GraphResult<EditResult> {
        let current = store.task(self.task_id.as_str())?.fields();
        match dialog.edit(Some(&current)) {
            DialogOutcome::Saved(fields) => {
                store.update_task(self.task_id.as_str(), fields)?;
                Ok(EditResult::Updated)
            }
            DialogOutcome::Deleted => {
                debug!(task_id = %self.task_id, "delete requested from editor");
                Ok(EditResult::DeleteRequested)
            }
            DialogOutcome::Cancelled => Ok(EditResult::Unchanged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::ScriptedDialog;
    use crate::store::StoreOptions;
    use crate::types::TaskFields;

    #[test]
    fn test_attach_is_idempotent() {
        let mut node = NodeController::new(TaskId::from("t1"));
        assert!(node.attach_connection(ConnectionId::from("c1")));
        assert!(!node.attach_connection(ConnectionId::from("c1")));
        assert_eq!(node.connections().len(), 1);

        assert!(node.detach_connection("c1"));
        assert!(!node.detach_connection("c1"));
        assert!(node.connections().is_empty());
    }

    #[test]
    fn test_open_editor_outcomes() {
        let mut store = GraphStore::new(StoreOptions::default());
        let id = store.add_task(TaskFields::titled("Draft")).unwrap();
        let node = NodeController::new(id.clone());

        let mut dialog = ScriptedDialog::new([
            DialogOutcome::Cancelled,
            DialogOutcome::Saved(TaskFields::titled("Final")),
            DialogOutcome::Deleted,
        ]);

        assert_eq!(
            node.open_editor(&mut store, &mut dialog).unwrap(),
            EditResult::Unchanged
        );
        assert_eq!(store.task(id.as_str()).unwrap().title, "Draft");

        assert_eq!(
            node.open_editor(&mut store, &mut dialog).unwrap(),
            EditResult::Updated
        );
        assert_eq!(store.task(id.as_str()).unwrap().title, "Final");

        assert_eq!(
            node.open_editor(&mut store, &mut dialog).unwrap(),
            EditResult::DeleteRequested
        );
        // Deletion is the caller's job.
        assert!(store.contains_task(id.as_str()));

        // The dialog saw the current fields each time.
        assert_eq!(dialog.seen()[1].as_ref().unwrap().title.as_deref(), Some("Draft"));
        assert_eq!(dialog.seen()[2].as_ref().unwrap().title.as_deref(), Some("Final"));
    }

    #[test]
    fn test_bounds_follow_position() {
        let mut store = GraphStore::new(StoreOptions::default());
        let id = store
            .add_task_at(TaskFields::titled("A"), Point::new(5.0, 6.0))
            .unwrap();
        let node = NodeController::new(id);
        let rect = node.bounds(&store, Size::new(10.0, 20.0)).unwrap();
        assert_eq!(rect.center(), Point::new(10.0, 16.0));
    }
}
