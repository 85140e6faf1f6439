//! Wiring of store, persistence adapter, edit session, and preferences.
//!
//! [`TodoApp`] is what a view talks to: it exposes the projected list and
//! the current filter, session, and preferences, and offers one method per
//! user action.

use std::fmt;

use ticklist_shared::{Filter, Task, TaskDraft, TaskId, TaskPatch, ThemeColor, ThemeMode};
use tracing::{error, info, warn};

use crate::error::{Result, TodoError};
use crate::persistence::{CommitMode, KeyValueStore, Persistence};
use crate::prefs::Preferences;
use crate::projection::{self, Counts};
use crate::session::{EditSession, Submission};
use crate::store::{StoreEvent, SubscriptionId, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Short message a view shows after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn added() -> Self {
        Self::success("Task added")
    }

    pub fn updated() -> Self {
        Self::success("Task updated")
    }

    pub fn deleted() -> Self {
        Self::success("Task deleted")
    }

    pub fn toggled(task: &Task) -> Self {
        if task.done {
            Self::success("Task marked as complete")
        } else {
            Self::success("Task marked as incomplete")
        }
    }

    pub fn from_error(err: &TodoError) -> Self {
        match err {
            TodoError::Validation => Self::error("Task name cannot be empty"),
            TodoError::NotFound(id) => Self::error(format!("No task with id {id}")),
            TodoError::EditRejected(_) => Self::error("Completed tasks cannot be edited"),
            TodoError::Persistence(inner) => Self::error(format!("Could not save changes: {inner}")),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub struct TodoApp<P> {
    store: TaskStore,
    backend: P,
    session: EditSession,
    filter: Filter,
    prefs: Preferences,
    prefs_storage: Box<dyn KeyValueStore>,
}

impl<P: fmt::Debug> fmt::Debug for TodoApp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoApp")
            .field("store", &self.store)
            .field("backend", &self.backend)
            .field("session", &self.session)
            .field("filter", &self.filter)
            .field("prefs", &self.prefs)
            .finish_non_exhaustive()
    }
}

impl<P: Persistence> TodoApp<P> {
    /// Loads preferences and seeds the store from the backend. A failed
    /// load is logged and leaves the store empty.
    #[tracing::instrument(skip_all)]
    pub async fn start(backend: P, prefs_storage: Box<dyn KeyValueStore>) -> Self {
        let prefs = Preferences::load(prefs_storage.as_ref());
        let mut store = TaskStore::new();
        match backend.load().await {
            Ok(tasks) => store.hydrate(tasks),
            Err(error) => error!(%error, "failed loading tasks; starting with an empty list"),
        }
        info!(count = store.len(), mode = ?backend.commit_mode(), "task list ready");

        Self {
            store,
            backend,
            session: EditSession::default(),
            filter: Filter::default(),
            prefs,
            prefs_storage,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn backend(&self) -> &P {
        &self.backend
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.list()
    }

    pub fn visible(&self) -> Vec<&Task> {
        projection::project(self.store.list(), self.filter)
    }

    pub fn counts(&self) -> Counts {
        Counts::of(self.store.list())
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        info!(%filter, "filter changed");
        self.filter = filter;
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    /// Logs a failed write made after an optimistic change. The change stays
    /// in memory; the error still goes back to the caller.
    fn after_optimistic<T>(&self, result: std::result::Result<T, crate::error::PersistenceError>) -> Result<T> {
        result.map_err(|error| {
            error!(%error, "change applied in memory but not written to storage");
            TodoError::from(error)
        })
    }

    #[tracing::instrument(skip_all, fields(name_len = draft.name.len()))]
    pub async fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        match self.backend.commit_mode() {
            CommitMode::Optimistic => {
                let task = self.store.create(&draft)?;
                let written = self.backend.create(&task, self.store.list()).await;
                self.after_optimistic(written)
            }
            CommitMode::Confirmed => {
                let candidate = self.store.prepare(&draft)?;
                let confirmed = self
                    .backend
                    .create(&candidate, self.store.list())
                    .await
                    .inspect_err(|error| warn!(%error, "create not confirmed; list unchanged"))?;
                Ok(self.store.adopt(confirmed))
            }
        }
    }

    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        match self.backend.commit_mode() {
            CommitMode::Optimistic => {
                let task = self.store.update(id, &patch)?;
                self.session.observe(&task);
                let written = self.backend.update(&task, self.store.list()).await;
                self.after_optimistic(written)
            }
            CommitMode::Confirmed => {
                let candidate = self.store.preview_update(id, &patch)?;
                let confirmed = self
                    .backend
                    .update(&candidate, self.store.list())
                    .await
                    .inspect_err(|error| warn!(%error, "update not confirmed; list unchanged"))?;
                let task = self.store.replace(id, confirmed)?;
                self.session.observe(&task);
                Ok(task)
            }
        }
    }

    pub async fn toggle(&mut self, id: &TaskId) -> Result<Task> {
        let done = self
            .store
            .get(id)
            .map(|task| task.done)
            .ok_or_else(|| TodoError::NotFound(id.clone()))?;
        self.update(
            id,
            TaskPatch {
                done: Some(!done),
                ..TaskPatch::default()
            },
        )
        .await
    }

    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn delete(&mut self, id: &TaskId) -> Result<()> {
        match self.backend.commit_mode() {
            CommitMode::Optimistic => {
                self.store.delete(id)?;
                self.forget_staged(id);
                let written = self.backend.remove(id, self.store.list()).await;
                self.after_optimistic(written)
            }
            CommitMode::Confirmed => {
                if self.store.get(id).is_none() {
                    return Err(TodoError::NotFound(id.clone()));
                }
                self.backend
                    .remove(id, self.store.list())
                    .await
                    .inspect_err(|error| warn!(%error, "delete not confirmed; list unchanged"))?;
                self.store.delete(id)?;
                self.forget_staged(id);
                Ok(())
            }
        }
    }

    fn forget_staged(&mut self, id: &TaskId) {
        if self.session.editing().is_some_and(|task| &task.id == id) {
            self.session.cancel();
        }
    }

    pub fn start_edit(&mut self, id: &TaskId) -> Result<()> {
        let task = self
            .store
            .get(id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))?;
        self.session.start(task)
    }

    pub fn cancel_edit(&mut self) {
        self.session.cancel();
    }

    /// Submits the form: creates when idle, updates the staged task when
    /// editing. The session returns to idle once the store has changed, even
    /// if the optimistic write that followed failed.
    pub async fn submit(&mut self, form: TaskDraft) -> Result<Task> {
        let result = match self.session.submission(&form)? {
            Submission::Create(draft) => self.create(draft).await,
            Submission::Update { id, patch } => self.update(&id, patch).await,
        };
        let applied = match &result {
            Ok(_) => true,
            Err(error) => error.is_persistence() && self.backend.commit_mode() == CommitMode::Optimistic,
        };
        if applied {
            self.session.finish();
        }
        result
    }

    pub fn set_theme(&mut self, theme: ThemeMode) -> Result<()> {
        self.prefs.set_theme(self.prefs_storage.as_ref(), theme)?;
        info!(theme = theme.storage_value(), "theme changed");
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<ThemeMode> {
        let next = self.prefs.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn set_color(&mut self, color: ThemeColor) -> Result<()> {
        self.prefs.set_color(self.prefs_storage.as_ref(), color)?;
        info!(color = color.storage_value(), "theme color changed");
        Ok(())
    }
}
