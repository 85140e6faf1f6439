//! In-memory task collection.
//!
//! [`TaskStore`] is the only owner of task records. Every mutation replaces
//! whole records (no field is edited in place) and is announced to
//! subscribers as a [`StoreEvent`].

use std::collections::HashSet;
use std::fmt;

use ticklist_shared::{Task, TaskDraft, TaskId, TaskPatch};
use tracing::{debug, info, warn};

use crate::error::{Result, TodoError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Hydrated { count: usize },
    Created(Task),
    Updated(Task),
    Deleted(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

#[derive(Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn validated_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TodoError::Validation);
    }
    Ok(trimmed.to_string())
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    fn position(&self, id: &TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| &task.id == id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        debug!(subscription = id.0, "store listener subscribed");
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        before != self.listeners.len()
    }

    fn emit(&mut self, event: StoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    /// Validates a draft and builds the record `create` would insert,
    /// without inserting it.
    pub fn prepare(&self, draft: &TaskDraft) -> Result<Task> {
        let name = validated_name(&draft.name)?;
        let mut id = TaskId::generate();
        while self.get(&id).is_some() {
            id = TaskId::generate();
        }
        Ok(Task {
            id,
            name,
            done: false,
            icon: draft.icon.unwrap_or_default(),
        })
    }

    #[tracing::instrument(skip(self, draft), fields(name_len = draft.name.len()))]
    pub fn create(&mut self, draft: &TaskDraft) -> Result<Task> {
        let task = self.prepare(draft)?;
        self.tasks.push(task.clone());
        info!(id = %task.id, count = self.tasks.len(), "task created");
        self.emit(StoreEvent::Created(task.clone()));
        Ok(task)
    }

    /// The record `update(id, patch)` would store.
    pub fn preview_update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        let current = &self.tasks[self.position(id)?];
        let name = match patch.name.as_deref() {
            Some(raw) => validated_name(raw)?,
            None => current.name.clone(),
        };
        Ok(Task {
            id: current.id.clone(),
            name,
            done: patch.done.unwrap_or(current.done),
            icon: patch.icon.unwrap_or(current.icon),
        })
    }

    #[tracing::instrument(skip_all, fields(id = %id))]
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        let next = self.preview_update(id, patch)?;
        self.replace(id, next)
    }

    pub fn toggle(&mut self, id: &TaskId) -> Result<Task> {
        let done = self.tasks[self.position(id)?].done;
        self.update(
            id,
            &TaskPatch {
                done: Some(!done),
                ..TaskPatch::default()
            },
        )
    }

    /// Swaps the record stored under `id` for `next`. If `next` carries a
    /// different id that is already present, that other record is dropped.
    #[tracing::instrument(skip_all, fields(id = %id, next_id = %next.id))]
    pub fn replace(&mut self, id: &TaskId, next: Task) -> Result<Task> {
        let idx = self.position(id)?;
        self.tasks[idx] = next.clone();
        if &next.id != id {
            let mut pos = 0;
            self.tasks.retain(|task| {
                let keep = pos == idx || task.id != next.id;
                pos += 1;
                keep
            });
        }
        debug!(done = next.done, "task replaced");
        self.emit(StoreEvent::Updated(next.clone()));
        Ok(next)
    }

    /// Deleting an unknown id is an error rather than a no-op.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub fn delete(&mut self, id: &TaskId) -> Result<()> {
        let idx = self.position(id)?;
        self.tasks.remove(idx);
        info!(count = self.tasks.len(), "task deleted");
        self.emit(StoreEvent::Deleted(id.clone()));
        Ok(())
    }

    /// Inserts a record confirmed by a persistence adapter, replacing any
    /// record that already has its id.
    #[tracing::instrument(skip_all, fields(id = %task.id))]
    pub fn adopt(&mut self, task: Task) -> Task {
        if let Some(idx) = self.tasks.iter().position(|t| t.id == task.id) {
            self.tasks[idx] = task.clone();
            self.emit(StoreEvent::Updated(task.clone()));
        } else {
            self.tasks.push(task.clone());
            self.emit(StoreEvent::Created(task.clone()));
        }
        task
    }

    /// Replaces the whole collection, keeping the first record of any
    /// repeated id.
    #[tracing::instrument(skip_all, fields(incoming = tasks.len()))]
    pub fn hydrate(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(tasks.len());
        for task in tasks {
            if seen.insert(task.id.clone()) {
                kept.push(task);
            } else {
                warn!(id = %task.id, "dropping task with duplicate id");
            }
        }
        self.tasks = kept;
        let count = self.tasks.len();
        info!(count, "store hydrated");
        self.emit(StoreEvent::Hydrated { count });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use ticklist_shared::Icon;

    use super::*;

    fn draft(name: &str) -> TaskDraft {
        TaskDraft::new(name, None)
    }

    fn assert_unique(store: &TaskStore) {
        let ids: HashSet<_> = store.list().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn create_assigns_defaults_and_appends() {
        let mut store = TaskStore::new();
        let first = store.create(&draft("first")).expect("create");
        let second = store
            .create(&TaskDraft::new("  second  ", Some(Icon::Rocket)))
            .expect("create");

        assert!(!first.id.is_empty());
        assert!(!first.done);
        assert_eq!(first.icon, Icon::Memo);
        assert_eq!(second.name, "second");
        assert_eq!(second.icon, Icon::Rocket);
        let names: Vec<_> = store.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn blank_name_is_rejected_without_mutation() {
        let mut store = TaskStore::new();
        store.create(&draft("keep")).expect("create");

        let err = store.create(&draft("   ")).expect_err("blank name");
        assert!(matches!(err, TodoError::Validation));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_merges_patch_and_keeps_order() {
        let mut store = TaskStore::new();
        let a = store.create(&draft("a")).expect("create");
        let b = store.create(&draft("b")).expect("create");
        let c = store.create(&draft("c")).expect("create");

        let updated = store
            .update(
                &b.id,
                &TaskPatch {
                    name: Some("bee".to_string()),
                    icon: Some(Icon::Books),
                    ..TaskPatch::default()
                },
            )
            .expect("update");

        assert_eq!(updated.id, b.id);
        assert_eq!(updated.name, "bee");
        assert_eq!(updated.icon, Icon::Books);
        assert!(!updated.done);
        let ids: Vec<_> = store.list().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, [a.id, b.id, c.id]);
    }

    #[test]
    fn update_unknown_id_leaves_store_unchanged() {
        let mut store = TaskStore::new();
        store.create(&draft("a")).expect("create");
        let before = store.list().to_vec();

        let err = store
            .update(&TaskId::new("missing"), &TaskPatch::rename("Buy oat milk"))
            .expect_err("unknown id");
        assert!(matches!(err, TodoError::NotFound(id) if id.as_str() == "missing"));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn update_with_blank_name_is_rejected() {
        let mut store = TaskStore::new();
        let task = store.create(&draft("a")).expect("create");

        let err = store
            .update(&task.id, &TaskPatch::rename(" \t"))
            .expect_err("blank rename");
        assert!(matches!(err, TodoError::Validation));
        assert_eq!(store.get(&task.id).map(|t| t.name.as_str()), Some("a"));
    }

    #[test]
    fn toggle_flips_done_both_ways() {
        let mut store = TaskStore::new();
        let task = store.create(&draft("a")).expect("create");

        assert!(store.toggle(&task.id).expect("toggle").done);
        assert!(!store.toggle(&task.id).expect("toggle").done);
    }

    #[test]
    fn delete_removes_and_reports_missing() {
        let mut store = TaskStore::new();
        let a = store.create(&draft("a")).expect("create");
        let b = store.create(&draft("b")).expect("create");
        let c = store.create(&draft("c")).expect("create");

        store.delete(&b.id).expect("delete");
        let ids: Vec<_> = store.list().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, [a.id, c.id]);

        let err = store.delete(&b.id).expect_err("second delete");
        assert!(matches!(err, TodoError::NotFound(_)));
    }

    #[test]
    fn adopt_and_hydrate_keep_ids_unique() {
        let mut store = TaskStore::new();
        let task = Task {
            id: TaskId::new("1"),
            name: "remote".to_string(),
            done: false,
            icon: Icon::Memo,
        };
        store.adopt(task.clone());
        store.adopt(Task {
            name: "remote, renamed".to_string(),
            ..task.clone()
        });
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "remote, renamed");

        store.hydrate(vec![
            task.clone(),
            Task {
                id: TaskId::new("2"),
                ..task.clone()
            },
            Task {
                name: "dupe".to_string(),
                ..task.clone()
            },
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].name, "remote");
        assert_unique(&store);
    }

    #[test]
    fn replace_with_new_id_drops_collision() {
        let mut store = TaskStore::new();
        let a = store.create(&draft("a")).expect("create");
        let b = store.create(&draft("b")).expect("create");

        store
            .replace(
                &a.id,
                Task {
                    id: b.id.clone(),
                    ..a.clone()
                },
            )
            .expect("replace");

        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "a");
        assert_unique(&store);
    }

    #[test]
    fn mixed_operations_never_duplicate_ids() {
        let mut store = TaskStore::new();
        let mut created = Vec::new();
        for round in 0..20 {
            let task = store.create(&draft(&format!("task {round}"))).expect("create");
            created.push(task.id.clone());
            if round % 3 == 0 {
                store.toggle(&task.id).expect("toggle");
            }
            if round % 4 == 1 {
                let victim = created.remove(0);
                store.delete(&victim).expect("delete");
            }
            if round % 5 == 2 {
                let adopted = store.list()[0].clone();
                store.adopt(adopted);
            }
            assert_unique(&store);
        }
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let mut store = TaskStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let task = store.create(&draft("a")).expect("create");
        let toggled = store.toggle(&task.id).expect("toggle");
        store.delete(&task.id).expect("delete");
        let _ = store.create(&draft("   "));

        assert_eq!(
            *seen.borrow(),
            vec![
                StoreEvent::Created(task.clone()),
                StoreEvent::Updated(toggled),
                StoreEvent::Deleted(task.id.clone()),
            ]
        );

        assert!(store.unsubscribe(sub));
        store.create(&draft("b")).expect("create");
        assert_eq!(seen.borrow().len(), 3);
    }
}
