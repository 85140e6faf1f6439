//! Durable mirrors of the task store.
//!
//! Two adapters exist. [`LocalAdapter`] writes the whole collection to a
//! key-value store after the store has already changed. [`RemoteAdapter`]
//! talks to an HTTP endpoint and the store only changes once the endpoint
//! has confirmed. [`CommitMode`] tells the caller which order applies.

pub mod kv;
pub mod local;
pub mod remote;

use std::time::Duration;

use anyhow::Context;
use ticklist_shared::{Task, TaskId};
use tracing::info;

use crate::config::{BackendKind, Config};
use crate::error::PersistenceError;

pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use local::LocalAdapter;
pub use remote::RemoteAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Mutate the store, then persist.
    Optimistic,
    /// Persist, then mutate the store with the confirmed record.
    Confirmed,
}

/// `snapshot` is the full collection as the store holds it when the call is
/// made: after the change for optimistic adapters, before it for confirmed
/// ones.
#[allow(async_fn_in_trait)]
pub trait Persistence {
    fn commit_mode(&self) -> CommitMode;

    async fn load(&self) -> Result<Vec<Task>, PersistenceError>;

    async fn create(&self, task: &Task, snapshot: &[Task]) -> Result<Task, PersistenceError>;

    async fn update(&self, task: &Task, snapshot: &[Task]) -> Result<Task, PersistenceError>;

    async fn remove(&self, id: &TaskId, snapshot: &[Task]) -> Result<(), PersistenceError>;
}

/// The adapter chosen by configuration.
#[derive(Debug)]
pub enum Backend {
    Local(LocalAdapter<FileKvStore>),
    Remote(RemoteAdapter),
}

impl Backend {
    #[tracing::instrument(skip_all)]
    pub fn from_config(cfg: &Config, storage: FileKvStore) -> anyhow::Result<Self> {
        match cfg.backend()? {
            BackendKind::Local => {
                info!(path = %storage.path().display(), "using local storage backend");
                Ok(Backend::Local(LocalAdapter::new(storage)))
            }
            BackendKind::Remote => {
                let endpoint = cfg
                    .get("remote.endpoint")
                    .context("remote backend requires remote.endpoint")?;
                let timeout = Duration::from_secs(cfg.get_u64("remote.timeout")?.unwrap_or(30));
                info!(%endpoint, ?timeout, "using remote backend");
                Ok(Backend::Remote(RemoteAdapter::new(&endpoint, timeout)?))
            }
        }
    }
}

impl Persistence for Backend {
    fn commit_mode(&self) -> CommitMode {
        match self {
            Backend::Local(adapter) => adapter.commit_mode(),
            Backend::Remote(adapter) => adapter.commit_mode(),
        }
    }

    async fn load(&self) -> Result<Vec<Task>, PersistenceError> {
        match self {
            Backend::Local(adapter) => adapter.load().await,
            Backend::Remote(adapter) => adapter.load().await,
        }
    }

    async fn create(&self, task: &Task, snapshot: &[Task]) -> Result<Task, PersistenceError> {
        match self {
            Backend::Local(adapter) => adapter.create(task, snapshot).await,
            Backend::Remote(adapter) => adapter.create(task, snapshot).await,
        }
    }

    async fn update(&self, task: &Task, snapshot: &[Task]) -> Result<Task, PersistenceError> {
        match self {
            Backend::Local(adapter) => adapter.update(task, snapshot).await,
            Backend::Remote(adapter) => adapter.update(task, snapshot).await,
        }
    }

    async fn remove(&self, id: &TaskId, snapshot: &[Task]) -> Result<(), PersistenceError> {
        match self {
            Backend::Local(adapter) => adapter.remove(id, snapshot).await,
            Backend::Remote(adapter) => adapter.remove(id, snapshot).await,
        }
    }
}
