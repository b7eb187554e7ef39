//! The board: one editing session over a graph.
//!
//! Owns the store, the controller scene, the connection-draw state machine,
//! the persistence subscriber and the renderer. Every public mutation goes
//! through here and ends in [`Board::commit`], which drains the store's events
//! to persistence first and the renderer second.

use crate::controller::{ConnectionDraw, DrawOutcome, DrawState, EditResult, Scene};
use crate::dialog::{DialogOutcome, EditorDialog};
use crate::error::{GraphError, GraphResult};
use crate::events::GraphEvent;
use crate::geometry::{Point, Rect, Size};
use crate::persist::{LoadStatus, Persistence, SnapshotSink, WritePolicy, load_store};
use crate::render::{ConnectionView, NodeView, Renderer};
use crate::store::{GraphStore, LoadReport, StoreOptions};
use crate::types::{ConnectionId, ConnectionRecord, TaskFields, TaskId};
use std::time::Instant;
use tracing::{debug, error};

/// Everything needed to open a board.
#[derive(Debug, Clone)]
pub struct BoardOptions {
    pub store: StoreOptions,
    pub node_size: Size,
    pub arrow_size: f64,
    pub write_policy: WritePolicy,
    pub pretty: bool,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            store: StoreOptions::default(),
            node_size: Size::new(200.0, 80.0),
            arrow_size: 15.0,
            write_policy: WritePolicy::Immediate,
            pretty: true,
        }
    }
}

pub struct Board<S: SnapshotSink, R: Renderer> {
    store: GraphStore,
    scene: Scene,
    draw: ConnectionDraw,
    persistence: Persistence<S>,
    renderer: R,
    arrow_size: f64,
    load_status: LoadStatus,
    load_report: LoadReport,
}

impl<S: SnapshotSink, R: Renderer> Board<S, R> {
    /// Load whatever `sink` holds and draw it.
    pub fn open(mut sink: S, options: BoardOptions, renderer: R) -> GraphResult<Self> {
        let loaded = load_store(&mut sink, options.store.clone());
        let mut board = Self::from_store(loaded.store, sink, options, renderer)?;
        board.load_status = loaded.status;
        board.load_report = loaded.report;
        Ok(board)
    }

    /// Wrap an existing store. Nothing is written until the first change.
    pub fn from_store(
        mut store: GraphStore,
        sink: S,
        options: BoardOptions,
        renderer: R,
    ) -> GraphResult<Self> {
        store.drain_events();
        let scene = Scene::from_store(&store, options.node_size)?;
        let persistence = Persistence::new(sink, options.write_policy).with_pretty(options.pretty);
        let mut board = Self {
            store,
            scene,
            draw: ConnectionDraw::new(),
            persistence,
            renderer,
            arrow_size: options.arrow_size,
            load_status: LoadStatus::Loaded,
            load_report: LoadReport::default(),
        };
        board.redraw_all();
        Ok(board)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn draw_state(&self) -> &DrawState {
        self.draw.state()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// End the session, writing anything still pending.
    pub fn close(mut self) {
        self.flush();
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Create a task at the configured new-task position.
    pub fn create_task(&mut self, fields: TaskFields) -> GraphResult<TaskId> {
        let pos = self.store.options().new_task_position;
        self.create_task_at(fields, pos)
    }

    pub fn create_task_at(&mut self, fields: TaskFields, pos: Point) -> GraphResult<TaskId> {
        let id = self.store.add_task_at(fields, pos)?;
        self.scene.add_node(id.clone());
        self.commit();
        Ok(id)
    }

    /// Ask the dialog for a new task's fields. Returns `None` when the dialog
    /// is dismissed; a delete answer counts as dismissal here.
    pub fn create_task_via_dialog(
        &mut self,
        dialog: &mut dyn EditorDialog,
    ) -> GraphResult<Option<TaskId>> {
        match dialog.edit(None) {
            DialogOutcome::Saved(fields) => self.create_task(fields).map(Some),
            DialogOutcome::Deleted | DialogOutcome::Cancelled => Ok(None),
        }
    }

    pub fn update_task(&mut self, id: &str, fields: TaskFields) -> GraphResult<()> {
        self.store
            .update_task(id, fields)
            .inspect_err(|e| log_precondition("update_task", e))?;
        self.commit();
        Ok(())
    }

    /// Drag end: store the new position and redraw attached lines.
    pub fn move_node(&mut self, id: &str, pos: Point) -> GraphResult<()> {
        self.scene
            .move_node(&mut self.store, id, pos)
            .inspect_err(|e| log_precondition("move_node", e))?;
        self.commit();
        Ok(())
    }

    /// Double-click: edit the task, deleting the node if the dialog says so.
    pub fn open_editor(&mut self, id: &str, dialog: &mut dyn EditorDialog) -> GraphResult<EditResult> {
        self.draw_dismiss();
        let node = self.scene.node(id).ok_or_else(|| {
            let e = GraphError::task_not_found(id);
            log_precondition("open_editor", &e);
            e
        })?;
        let result = node.open_editor(&mut self.store, dialog)?;
        match result {
            EditResult::DeleteRequested => {
                self.delete_node(id)?;
            }
            EditResult::Updated | EditResult::Unchanged => self.commit(),
        }
        Ok(result)
    }

    /// Remove a node, its task and every connection touching it.
    pub fn delete_node(&mut self, id: &str) -> GraphResult<Vec<ConnectionId>> {
        let removed = self
            .scene
            .delete_node(&mut self.store, id)
            .inspect_err(|e| log_precondition("delete_node", e))?;
        let outcome = self.draw.forget(&TaskId::from(id));
        if outcome != DrawOutcome::Ignored {
            debug!(task_id = %id, "pending connection source deleted");
        }
        self.commit();
        Ok(removed)
    }

    /// Mark a node selected or not.
    pub fn set_selected(&mut self, id: &str, selected: bool) -> GraphResult<()> {
        let node = self
            .scene
            .node_mut(id)
            .ok_or_else(|| GraphError::task_not_found(id))?;
        node.set_selected(selected);
        self.redraw_node(id);
        Ok(())
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Right-click on a node: feed the connection-draw state machine.
    ///
    /// The first gesture marks the node as the pending source. A gesture on a
    /// different node connects source to target; a gesture on the source
    /// itself cancels. Either way the source mark is cleared.
    pub fn node_gesture(&mut self, id: &str) -> GraphResult<DrawOutcome> {
        let node = match self.scene.node(id) {
            Some(node) => node.task_id().clone(),
            None => {
                let e = GraphError::task_not_found(id);
                log_precondition("node_gesture", &e);
                return Err(e);
            }
        };

        let outcome = self.draw.gesture_on(&node);
        match &outcome {
            DrawOutcome::Started(source) => self.mark_pending(source, true),
            DrawOutcome::Connect { from, to } => {
                self.mark_pending(from, false);
                self.link(from.as_str(), to.as_str())
                    .inspect_err(|e| log_precondition("node_gesture", e))?;
            }
            DrawOutcome::Cancelled(source) => self.mark_pending(source, false),
            DrawOutcome::Ignored => {}
        }
        self.commit();
        Ok(outcome)
    }

    /// Any non-connect input (plain click, Escape): abandon a pending draw.
    pub fn dismiss(&mut self) -> DrawOutcome {
        self.draw_dismiss()
    }

    /// Connect two tasks directly. `None` when the pair already exists.
    pub fn connect(&mut self, from: &str, to: &str) -> GraphResult<Option<ConnectionId>> {
        let id = self
            .link(from, to)
            .inspect_err(|e| log_precondition("connect", e))?;
        self.commit();
        Ok(id)
    }

    pub fn delete_connection(&mut self, id: &str) -> GraphResult<ConnectionRecord> {
        let record = self
            .scene
            .delete_connection(&mut self.store, id)
            .inspect_err(|e| log_precondition("delete_connection", e))?;
        self.commit();
        Ok(record)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Let a debounced write happen if it is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.persistence.flush_due(&self.store, now)
    }

    /// Write any pending change now.
    pub fn flush(&mut self) -> bool {
        self.persistence.flush(&self.store)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn link(&mut self, from: &str, to: &str) -> GraphResult<Option<ConnectionId>> {
        let created = self.store.add_connection(from, to)?;
        if let Some(id) = &created {
            self.scene.add_connection(&self.store, id.as_str())?;
        }
        Ok(created)
    }

    fn draw_dismiss(&mut self) -> DrawOutcome {
        let outcome = self.draw.dismiss();
        if let DrawOutcome::Cancelled(source) = &outcome {
            self.mark_pending(source, false);
        }
        outcome
    }

    fn mark_pending(&mut self, id: &TaskId, pending: bool) {
        if let Some(node) = self.scene.node_mut(id.as_str()) {
            node.set_pending_source(pending);
            self.redraw_node(id.as_str());
        }
    }

    /// Hand queued store events to persistence, then to the renderer.
    fn commit(&mut self) {
        let events = self.store.drain_events();
        if events.is_empty() {
            return;
        }
        self.persistence.notify(&events, &self.store, Instant::now());
        for event in &events {
            self.render_event(event);
        }
    }

    fn render_event(&mut self, event: &GraphEvent) {
        match event {
            GraphEvent::TaskAdded(id) | GraphEvent::TaskUpdated(id) => self.redraw_node(id.as_str()),
            GraphEvent::TaskMoved(id) => {
                self.redraw_node(id.as_str());
                let attached = self
                    .scene
                    .node(id.as_str())
                    .map(|node| node.connections().to_vec())
                    .unwrap_or_default();
                for connection in attached {
                    self.redraw_connection(connection.as_str());
                }
            }
            GraphEvent::TaskRemoved { task, connections } => {
                for connection in connections {
                    self.renderer.remove_connection(connection);
                }
                self.renderer.remove_node(task);
            }
            GraphEvent::ConnectionAdded(id) => self.redraw_connection(id.as_str()),
            GraphEvent::ConnectionRemoved(id) => self.renderer.remove_connection(id),
        }
    }

    fn redraw_all(&mut self) {
        let tasks: Vec<TaskId> = self.store.tasks().iter().map(|t| t.id.clone()).collect();
        for id in &tasks {
            self.redraw_node(id.as_str());
        }
        let connections: Vec<ConnectionId> =
            self.store.connections().iter().map(|c| c.id.clone()).collect();
        for id in &connections {
            self.redraw_connection(id.as_str());
        }
    }

    fn redraw_node(&mut self, id: &str) {
        let (Some(node), Ok(task)) = (self.scene.node(id), self.store.task(id)) else {
            return;
        };
        let view = NodeView {
            task,
            bounds: Rect::new(task.pos, self.scene.node_size()),
            selected: node.is_selected(),
            pending_source: node.is_pending_source(),
        };
        self.renderer.draw_node(&view);
    }

    fn redraw_connection(&mut self, id: &str) {
        let Some(controller) = self.scene.connection(id) else {
            return;
        };
        let line = controller.geometry();
        let view = ConnectionView {
            id: controller.id(),
            from: controller.from(),
            to: controller.to(),
            line,
            arrow: line.arrow_head(self.arrow_size),
        };
        self.renderer.draw_connection(&view);
    }
}

fn log_precondition(op: &str, e: &GraphError) {
    if e.code.is_precondition() {
        error!(op, code = ?e.code, error = %e, "precondition violated");
    }
}

impl<S: SnapshotSink, R: Renderer> Drop for Board<S, R> {
    fn drop(&mut self) {
        if self.persistence.is_dirty() {
            debug!("board dropped with pending changes, writing them now");
        }
        self.flush();
    }
}
