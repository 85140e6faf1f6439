//! Create/edit form state.

use ticklist_shared::{Task, TaskDraft, TaskId, TaskPatch};
use tracing::{debug, warn};

use crate::error::{Result, TodoError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Idle,
    /// Holds a copy of the task being edited, never the stored record.
    Editing(Task),
}

/// What submitting the form asks the store to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(TaskDraft),
    Update { id: TaskId, patch: TaskPatch },
}

impl EditSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, EditSession::Idle)
    }

    pub fn editing(&self) -> Option<&Task> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing(task) => Some(task),
        }
    }

    /// Stages `task` for editing, replacing any earlier snapshot. A
    /// completed task is refused and the current state is kept.
    pub fn start(&mut self, task: &Task) -> Result<()> {
        if task.done {
            warn!(id = %task.id, "refusing to edit a completed task");
            return Err(TodoError::EditRejected(task.id.clone()));
        }
        if let EditSession::Editing(previous) = self {
            debug!(previous = %previous.id, next = %task.id, "replacing edit snapshot");
        }
        *self = EditSession::Editing(task.clone());
        Ok(())
    }

    pub fn cancel(&mut self) {
        *self = EditSession::Idle;
    }

    /// Follows a change to a stored record. A staged task that became
    /// completed leaves the session; otherwise the snapshot is refreshed.
    pub fn observe(&mut self, task: &Task) {
        let EditSession::Editing(staged) = self else {
            return;
        };
        if staged.id != task.id {
            return;
        }
        if task.done {
            debug!(id = %task.id, "staged task completed; leaving edit session");
            *self = EditSession::Idle;
        } else {
            *staged = task.clone();
        }
    }

    /// Turns the submitted form into a store request. The session itself
    /// is left as is; call [`EditSession::finish`] once the request has
    /// been applied.
    pub fn submission(&self, form: &TaskDraft) -> Result<Submission> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(TodoError::Validation);
        }

        Ok(match self {
            EditSession::Idle => Submission::Create(TaskDraft {
                name: name.to_string(),
                icon: form.icon,
            }),
            EditSession::Editing(task) => Submission::Update {
                id: task.id.clone(),
                patch: TaskPatch {
                    name: Some(name.to_string()),
                    done: None,
                    icon: Some(form.icon.unwrap_or(task.icon)),
                },
            },
        })
    }

    pub fn finish(&mut self) {
        *self = EditSession::Idle;
    }
}
