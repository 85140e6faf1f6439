use std::path::PathBuf;

use thiserror::Error;
use ticklist_shared::TaskId;

/// Failures of the task list core.
#[derive(Debug, Error)]
pub enum TodoError {
    /// The task name was blank after trimming.
    #[error("task name cannot be empty")]
    Validation,
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Completed tasks never enter an edit session.
    #[error("completed tasks cannot be edited: {0}")]
    EditRejected(TaskId),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl TodoError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, TodoError::Persistence(_))
    }
}

/// Network or storage failures raised by a persistence adapter.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("{method} {endpoint} failed: {source}")]
    Transport {
        method: String,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {endpoint} returned HTTP {status}: {body}")]
    Status {
        method: String,
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("create response carried no task id")]
    MissingId,
    #[error("could not encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = TodoError> = std::result::Result<T, E>;
