//! Editor dialog collaborator.
//!
//! The form that edits a task's fields is outside this crate. It is reached
//! through [`EditorDialog`], which gets the current fields (or `None` when
//! creating a task) and says what the user did.

use crate::types::TaskFields;
use std::collections::VecDeque;

/// How an editor session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome {
    /// Save with these fields.
    Saved(TaskFields),
    /// Delete the task. Not offered when creating.
    Deleted,
    /// Dismissed.
    Cancelled,
}

pub trait EditorDialog {
    /// Show the editor. `current` is `None` when creating a new task.
    fn edit(&mut self, current: Option<&TaskFields>) -> DialogOutcome;
}

/// Answers from a fixed script; once the script runs out every session is
/// cancelled. Records the fields each session was opened with.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    script: VecDeque<DialogOutcome>,
    seen: Vec<Option<TaskFields>>,
}

impl ScriptedDialog {
    pub fn new(script: impl IntoIterator<Item = DialogOutcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
            seen: Vec::new(),
        }
    }

    /// A dialog that saves `fields` once.
    pub fn saving(fields: TaskFields) -> Self {
        Self::new([DialogOutcome::Saved(fields)])
    }

    /// A dialog that asks for deletion once.
    pub fn deleting() -> Self {
        Self::new([DialogOutcome::Deleted])
    }

    /// Inputs of every session so far, oldest first.
    pub fn seen(&self) -> &[Option<TaskFields>] {
        &self.seen
    }
}

impl EditorDialog for ScriptedDialog {
    fn edit(&mut self, current: Option<&TaskFields>) -> DialogOutcome {
        self.seen.push(current.cloned());
        self.script.pop_front().unwrap_or(DialogOutcome::Cancelled)
    }
}
