//! Connection controller: live geometry for one connection record.

use super::node::NodeController;
use crate::error::GraphResult;
use crate::geometry::{LineSegment, Rect, Size};
use crate::store::GraphStore;
use crate::types::{ConnectionId, ConnectionRecord, TaskId};
use std::collections::HashMap;

/// Wraps a connection by id and keeps its rendered line in step with the two
/// endpoint nodes. The line is derived state and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionController {
    id: ConnectionId,
    from: TaskId,
    to: TaskId,
    geometry: LineSegment,
}

impl ConnectionController {
    /// Build a controller for `record` with its geometry already computed.
    pub fn new(record: &ConnectionRecord, store: &GraphStore, node_size: Size) -> GraphResult<Self> {
        let mut controller = Self {
            id: record.id.clone(),
            from: record.from.clone(),
            to: record.to.clone(),
            geometry: LineSegment::default(),
        };
        controller.recompute_geometry(store, node_size)?;
        Ok(controller)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn from(&self) -> &TaskId {
        &self.from
    }

    pub fn to(&self) -> &TaskId {
        &self.to
    }

    pub fn geometry(&self) -> LineSegment {
        self.geometry
    }

    /// Re-derive the line from the centers of both endpoint boxes.
    pub fn recompute_geometry(&mut self, store: &GraphStore, node_size: Size) -> GraphResult<()> {
        let start = Rect::new(store.task(self.from.as_str())?.pos, node_size).center();
        let end = Rect::new(store.task(self.to.as_str())?.pos, node_size).center();
        self.geometry = LineSegment::new(start, end);
        Ok(())
    }

    /// Detach from both endpoint nodes, then remove the record from the store.
    pub fn delete(
        &self,
        nodes: &mut HashMap<TaskId, NodeController>,
        store: &mut GraphStore,
    ) -> GraphResult<ConnectionRecord> {
        for endpoint in [&self.from, &self.to] {
            if let Some(node) = nodes.get_mut(endpoint) {
                node.detach_connection(self.id.as_str());
            }
        }
        store.remove_connection(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::store::StoreOptions;
    use crate::types::TaskFields;

    const NODE: Size = Size::new(200.0, 80.0);

    #[test]
    fn test_geometry_joins_centers() {
        let mut store = GraphStore::new(StoreOptions::default());
        let a = store
            .add_task_at(TaskFields::titled("A"), Point::new(0.0, 0.0))
            .unwrap();
        let b = store
            .add_task_at(TaskFields::titled("B"), Point::new(400.0, 100.0))
            .unwrap();
        let c = store.add_connection(a.as_str(), b.as_str()).unwrap().unwrap();

        let mut controller =
            ConnectionController::new(store.connection(c.as_str()).unwrap(), &store, NODE).unwrap();
        assert_eq!(controller.geometry().start, Point::new(100.0, 40.0));
        assert_eq!(controller.geometry().end, Point::new(500.0, 140.0));

        store.move_task(b.as_str(), Point::new(0.0, 200.0)).unwrap();
        controller.recompute_geometry(&store, NODE).unwrap();
        assert_eq!(controller.geometry().end, Point::new(100.0, 240.0));
    }

    #[test]
    fn test_delete_detaches_endpoints() {
        let mut store = GraphStore::new(StoreOptions::default());
        let a = store.add_task(TaskFields::titled("A")).unwrap();
        let b = store.add_task(TaskFields::titled("B")).unwrap();
        let c = store.add_connection(a.as_str(), b.as_str()).unwrap().unwrap();
        let controller =
            ConnectionController::new(store.connection(c.as_str()).unwrap(), &store, NODE).unwrap();

        let mut nodes = HashMap::new();
        for id in [&a, &b] {
            let mut node = NodeController::new(id.clone());
            node.attach_connection(c.clone());
            nodes.insert(id.clone(), node);
        }

        let removed = controller.delete(&mut nodes, &mut store).unwrap();

        assert_eq!(removed.id, c);
        assert!(nodes[&a].connections().is_empty());
        assert!(nodes[&b].connections().is_empty());
        assert_eq!(store.connection_count(), 0);
    }
}
