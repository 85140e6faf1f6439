use ticklist_shared::{Filter, Task};

/// Visible tasks for `filter`, in store order.
pub fn project(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|task| filter.accepts(task)).collect()
}

/// Like [`project`], for a filter given by name. Unknown names show
/// every task.
pub fn project_named<'a>(tasks: &'a [Task], name: &str) -> Vec<&'a Task> {
    project(tasks, Filter::from_name(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub all: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Counts {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.done).count();
        Self {
            all: tasks.len(),
            completed,
            pending: tasks.len() - completed,
        }
    }

    pub fn for_filter(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.all,
            Filter::Completed => self.completed,
            Filter::Pending => self.pending,
        }
    }
}
