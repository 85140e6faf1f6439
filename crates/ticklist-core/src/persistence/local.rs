use ticklist_shared::{Task, TaskId};
use tracing::{debug, warn};

use super::{CommitMode, KeyValueStore, Persistence};
use crate::error::PersistenceError;

pub const TASKS_KEY: &str = "tasks";

/// Keeps the task collection under a single key, rewritten in full after
/// every change.
#[derive(Debug)]
pub struct LocalAdapter<K> {
    storage: K,
}

impl<K: KeyValueStore> LocalAdapter<K> {
    pub fn new(storage: K) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    fn write_all(&self, snapshot: &[Task]) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(snapshot).map_err(|source| PersistenceError::Encode {
            what: "task list",
            source,
        })?;
        self.storage.set(TASKS_KEY, &payload)?;
        debug!(count = snapshot.len(), "task list written");
        Ok(())
    }
}

impl<K: KeyValueStore> Persistence for LocalAdapter<K> {
    fn commit_mode(&self) -> CommitMode {
        CommitMode::Optimistic
    }

    /// Never fails: missing or unreadable state loads as an empty list.
    #[tracing::instrument(skip(self))]
    async fn load(&self) -> Result<Vec<Task>, PersistenceError> {
        let raw = match self.storage.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored tasks");
                return Ok(Vec::new());
            }
            Err(error) => {
                warn!(%error, "failed reading stored tasks; starting empty");
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded stored tasks");
                Ok(tasks)
            }
            Err(error) => {
                warn!(%error, "failed parsing stored tasks; starting empty");
                Ok(Vec::new())
            }
        }
    }

    #[tracing::instrument(skip_all, fields(id = %task.id))]
    async fn create(&self, task: &Task, snapshot: &[Task]) -> Result<Task, PersistenceError> {
        self.write_all(snapshot)?;
        Ok(task.clone())
    }

    #[tracing::instrument(skip_all, fields(id = %task.id))]
    async fn update(&self, task: &Task, snapshot: &[Task]) -> Result<Task, PersistenceError> {
        self.write_all(snapshot)?;
        Ok(task.clone())
    }

    #[tracing::instrument(skip_all, fields(id = %id))]
    async fn remove(&self, id: &TaskId, snapshot: &[Task]) -> Result<(), PersistenceError> {
        self.write_all(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use ticklist_shared::Icon;

    use super::*;
    use crate::persistence::MemoryKvStore;

    fn task(id: &str, done: bool) -> Task {
        Task {
            id: TaskId::new(id),
            name: format!("task {id}"),
            done,
            icon: Icon::Memo,
        }
    }

    #[tokio::test]
    async fn missing_key_loads_empty() {
        let adapter = LocalAdapter::new(MemoryKvStore::new());
        assert!(adapter.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_loads_empty() {
        let adapter = LocalAdapter::new(MemoryKvStore::new().with_entry(TASKS_KEY, "[{\"id\":"));
        assert!(adapter.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn every_write_replaces_the_whole_collection() {
        let adapter = LocalAdapter::new(MemoryKvStore::new());
        let a = task("a", false);
        let b = task("b", true);

        adapter
            .create(&a, &[a.clone()])
            .await
            .expect("create");
        adapter
            .create(&b, &[a.clone(), b.clone()])
            .await
            .expect("create");
        assert_eq!(adapter.load().await.expect("load"), vec![a.clone(), b.clone()]);

        adapter
            .remove(&a.id, &[b.clone()])
            .await
            .expect("remove");
        assert_eq!(adapter.load().await.expect("load"), vec![b]);
    }
}
