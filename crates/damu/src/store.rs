//! The authoritative task collection for one authenticated session.

use crate::error::TransitionError;
use crate::protocol::{Task, TaskStatus};

/// Active and completed tasks. The two lists never share an id, `active`
/// holds no completed task, and `completed` is ordered newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    active: Vec<Task>,
    completed: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[Task] {
        &self.active
    }

    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty()
    }

    /// Install a fresh fetch result.
    pub fn replace_all(&mut self, active: Vec<Task>, completed: Vec<Task>) {
        self.replace_completed(completed);
        self.replace_active(active);
    }

    /// Install the active leg of a fetch. Completed records and ids already
    /// in the completed list are dropped.
    pub fn replace_active(&mut self, tasks: Vec<Task>) {
        let completed = &self.completed;
        self.active = tasks
            .into_iter()
            .filter(|t| {
                let keep =
                    t.status() != TaskStatus::Completed && !completed.iter().any(|c| c.id == t.id);
                if !keep {
                    tracing::warn!(task_id = %t.id, status = %t.status(), "dropping task from active list");
                }
                keep
            })
            .collect();
    }

    /// Install the completed leg of a fetch, newest first.
    pub fn replace_completed(&mut self, tasks: Vec<Task>) {
        let mut completed: Vec<Task> = tasks
            .into_iter()
            .filter(|t| {
                let keep = t.completed_at_ms().is_some();
                if !keep {
                    tracing::warn!(task_id = %t.id, status = %t.status(), "dropping task from completed list");
                }
                keep
            })
            .collect();
        completed.sort_by_key(|t| std::cmp::Reverse(t.completed_at_ms()));
        self.active.retain(|a| !completed.iter().any(|c| c.id == a.id));
        self.completed = completed;
    }

    /// Apply a non-terminal transition to an active task. `Completed` is
    /// routed through [`TaskStore::complete`] with the current time.
    pub fn update_status(&mut self, id: &str, status: TaskStatus) -> Result<(), TransitionError> {
        if status == TaskStatus::Completed {
            return self.complete(id, crate::now_ms());
        }
        let task = self
            .active
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| unknown(id))?;
        task.advance_to(status, 0)
    }

    /// Stamp an in-progress task as completed and move it to the head of the
    /// completed list.
    pub fn complete(&mut self, id: &str, now_ms: u64) -> Result<(), TransitionError> {
        let Some(idx) = self.active.iter().position(|t| t.id == id) else {
            if let Some(done) = self.completed.iter().find(|t| t.id == id) {
                return Err(TransitionError::Illegal {
                    id: id.to_string(),
                    from: done.status(),
                    to: TaskStatus::Completed,
                });
            }
            return Err(unknown(id));
        };

        let mut task = self.active[idx].clone();
        task.advance_to(TaskStatus::Completed, now_ms)?;
        self.active.remove(idx);
        self.completed.insert(0, task);
        Ok(())
    }

    /// Apply the single legal next transition. Returns the new status.
    pub fn advance(&mut self, id: &str, now_ms: u64) -> Result<TaskStatus, TransitionError> {
        let current = self
            .active
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.status())
            .ok_or_else(|| unknown(id))?;
        let Some(next) = current.next() else {
            return Err(TransitionError::Illegal {
                id: id.to_string(),
                from: current,
                to: current,
            });
        };
        if next == TaskStatus::Completed {
            self.complete(id, now_ms)?;
        } else {
            self.update_status(id, next)?;
        }
        Ok(next)
    }

    /// Append a newly created task to the active list. Completed tasks and
    /// ids already held in either list are refused.
    pub fn push_active(&mut self, task: Task) -> Result<(), TransitionError> {
        if self.get(&task.id).is_some() {
            return Err(TransitionError::Duplicate(task.id));
        }
        if task.status() == TaskStatus::Completed {
            return Err(TransitionError::Illegal {
                id: task.id,
                from: TaskStatus::Completed,
                to: TaskStatus::New,
            });
        }
        self.active.push(task);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.completed.clear();
    }
}

fn unknown(id: &str) -> TransitionError {
    TransitionError::UnknownTask(id.to_string())
}
