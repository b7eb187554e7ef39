//! Connection-draw state machine.
//!
//! Tracks whether a connection is being drawn and from which node. It is pure
//! state: the caller applies the returned [`DrawOutcome`] (marking the source
//! node, creating the connection).

use crate::types::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    /// A source node has been chosen; waiting for the target.
    Pending(TaskId),
}

/// Result of feeding one input to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// `Idle -> Pending(source)`.
    Started(TaskId),
    /// `Pending(from) -> Idle`; the caller should connect `from -> to`.
    Connect { from: TaskId, to: TaskId },
    /// `Pending(source) -> Idle` without a connection.
    Cancelled(TaskId),
    /// Input had no effect.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionDraw {
    state: DrawState,
}

impl ConnectionDraw {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn pending_source(&self) -> Option<&TaskId> {
        match &self.state {
            DrawState::Pending(source) => Some(source),
            DrawState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == DrawState::Idle
    }

    /// A connect gesture (right click) on `node`.
    pub fn gesture_on(&mut self, node: &TaskId) -> DrawOutcome {
        match std::mem::take(&mut self.state) {
            DrawState::Idle => {
                self.state = DrawState::Pending(node.clone());
                DrawOutcome::Started(node.clone())
            }
            DrawState::Pending(source) if &source == node => DrawOutcome::Cancelled(source),
            DrawState::Pending(source) => DrawOutcome::Connect {
                from: source,
                to: node.clone(),
            },
        }
    }

    /// Any other input that abandons a pending connection (plain click).
    pub fn dismiss(&mut self) -> DrawOutcome {
        match std::mem::take(&mut self.state) {
            DrawState::Pending(source) => DrawOutcome::Cancelled(source),
            DrawState::Idle => DrawOutcome::Ignored,
        }
    }

    /// Drop a pending source that no longer exists.
    pub fn forget(&mut self, node: &TaskId) -> DrawOutcome {
        if self.pending_source() == Some(node) {
            self.dismiss()
        } else {
            DrawOutcome::Ignored
        }
    }
}
