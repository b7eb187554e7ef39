//! Renderer collaborator.
//!
//! Painting lives outside this crate. The board tells a [`Renderer`] what to
//! redraw after each change, handing it everything needed in a view struct.

use crate::geometry::{LineSegment, Point, Rect};
use crate::types::{ConnectionId, TaskId, TaskRecord};
use tracing::trace;

/// A node as it should appear right now.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView<'a> {
    pub task: &'a TaskRecord,
    pub bounds: Rect,
    pub selected: bool,
    /// Highlighted as the source of a connection being drawn.
    pub pending_source: bool,
}

/// A connection as it should appear right now.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionView<'a> {
    pub id: &'a ConnectionId,
    pub from: &'a TaskId,
    pub to: &'a TaskId,
    pub line: LineSegment,
    /// Wing tips of the arrow head at `line.end`.
    pub arrow: [Point; 2],
}

pub trait Renderer {
    fn draw_node(&mut self, view: &NodeView<'_>);
    fn draw_connection(&mut self, view: &ConnectionView<'_>);
    fn remove_node(&mut self, id: &TaskId);
    fn remove_connection(&mut self, id: &ConnectionId);
}

/// Renderer for headless runs; draw calls only reach the trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_node(&mut self, view: &NodeView<'_>) {
        trace!(task_id = %view.task.id, "draw node");
    }

    fn draw_connection(&mut self, view: &ConnectionView<'_>) {
        trace!(connection_id = %view.id, "draw connection");
    }

    fn remove_node(&mut self, id: &TaskId) {
        trace!(task_id = %id, "remove node");
    }

    fn remove_connection(&mut self, id: &ConnectionId) {
        trace!(connection_id = %id, "remove connection");
    }
}

/// One call received by a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Node {
        id: TaskId,
        bounds: Rect,
        selected: bool,
        pending_source: bool,
    },
    Connection {
        id: ConnectionId,
        line: LineSegment,
    },
    RemoveNode(TaskId),
    RemoveConnection(ConnectionId),
}

/// Keeps every call it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    calls: Vec<DrawCall>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Last line drawn for a connection.
    pub fn last_line(&self, id: &str) -> Option<LineSegment> {
        self.calls.iter().rev().find_map(|call| match call {
            DrawCall::Connection { id: cid, line } if cid.as_str() == id => Some(*line),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn draw_node(&mut self, view: &NodeView<'_>) {
        self.calls.push(DrawCall::Node {
            id: view.task.id.clone(),
            bounds: view.bounds,
            selected: view.selected,
            pending_source: view.pending_source,
        });
    }

    fn draw_connection(&mut self, view: &ConnectionView<'_>) {
        self.calls.push(DrawCall::Connection {
            id: view.id.clone(),
            line: view.line,
        });
    }

    fn remove_node(&mut self, id: &TaskId) {
        self.calls.push(DrawCall::RemoveNode(id.clone()));
    }

    fn remove_connection(&mut self, id: &ConnectionId) {
        self.calls.push(DrawCall::RemoveConnection(id.clone()));
    }
}
