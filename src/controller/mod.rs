//! Controllers: the interactive layer over the graph store.
//!
//! Controllers refer to records by id and keep only transient state
//! (selection, attached connections, derived lines). [`Scene`] owns them all,
//! keyed by id, so nodes and connections never hold references to each other.

pub mod connection;
pub mod draw;
pub mod node;

pub use connection::ConnectionController;
pub use draw::{ConnectionDraw, DrawOutcome, DrawState};
pub use node::{EditResult, NodeController};

use crate::error::{GraphError, GraphResult};
use crate::geometry::{Point, Size};
use crate::store::GraphStore;
use crate::types::{ConnectionId, ConnectionRecord, TaskId};
use std::collections::HashMap;

/// Every live controller, keyed by record id.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: HashMap<TaskId, NodeController>,
    connections: HashMap<ConnectionId, ConnectionController>,
    node_size: Size,
}

impl Scene {
    pub fn new(node_size: Size) -> Self {
        Self {
            nodes: HashMap::new(),
            connections: HashMap::new(),
            node_size,
        }
    }

    /// Build controllers for every record in `store`.
    pub fn from_store(store: &GraphStore, node_size: Size) -> GraphResult<Self> {
        let mut scene = Self::new(node_size);
        for task in store.tasks() {
            scene.add_node(task.id.clone());
        }
        for connection in store.connections() {
            scene.add_connection(store, connection.id.as_str())?;
        }
        Ok(scene)
    }

    pub fn node_size(&self) -> Size {
        self.node_size
    }

    pub fn node(&self, id: &str) -> Option<&NodeController> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeController> {
        self.nodes.get_mut(id)
    }

    pub fn connection(&self, id: &str) -> Option<&ConnectionController> {
        self.connections.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeController> {
        self.nodes.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &ConnectionController> {
        self.connections.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Register a node for a task already in the store.
    pub fn add_node(&mut self, id: TaskId) {
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| NodeController::new(id));
    }

    /// Register a controller for a connection already in the store and attach
    /// it to both endpoint nodes.
    pub fn add_connection(&mut self, store: &GraphStore, id: &str) -> GraphResult<()> {
        let record = store.connection(id)?;
        let controller = ConnectionController::new(record, store, self.node_size)?;
        for endpoint in [&record.from, &record.to] {
            self.nodes
                .get_mut(endpoint)
                .ok_or_else(|| GraphError::task_not_found(endpoint.as_str()))?
                .attach_connection(record.id.clone());
        }
        self.connections.insert(record.id.clone(), controller);
        Ok(())
    }

    /// Drag a node to `pos`.
    pub fn move_node(&mut self, store: &mut GraphStore, id: &str, pos: Point) -> GraphResult<()> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::task_not_found(id))?;
        node.move_to(store, &mut self.connections, pos, self.node_size)
    }

    /// Delete a connection through its controller.
    pub fn delete_connection(
        &mut self,
        store: &mut GraphStore,
        id: &str,
    ) -> GraphResult<ConnectionRecord> {
        let controller = self
            .connections
            .get(id)
            .ok_or_else(|| GraphError::connection_not_found(id))?;
        let record = controller.delete(&mut self.nodes, store)?;
        self.connections.remove(id);
        Ok(record)
    }

    /// Delete a node: the store cascades the records, then every incident
    /// connection controller is detached and dropped along with the node.
    pub fn delete_node(&mut self, store: &mut GraphStore, id: &str) -> GraphResult<Vec<ConnectionId>> {
        let cascaded = store.remove_task(id)?;
        for connection_id in &cascaded {
            if let Some(controller) = self.connections.remove(connection_id) {
                for endpoint in [controller.from(), controller.to()] {
                    if let Some(node) = self.nodes.get_mut(endpoint) {
                        node.detach_connection(connection_id.as_str());
                    }
                }
            }
        }
        self.nodes.remove(id);
        Ok(cascaded)
    }

    /// Recompute every connection line.
    pub fn sync_geometry(&mut self, store: &GraphStore) -> GraphResult<()> {
        for controller in self.connections.values_mut() {
            controller.recompute_geometry(store, self.node_size)?;
        }
        Ok(())
    }
}
