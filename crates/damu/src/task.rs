//! Agent task status machine.
//!
//! `New → Accepted → In Progress → Completed`, one step at a time.

use crate::error::TransitionError;
use crate::protocol::{Task, TaskDetails, TaskKind, TaskState, TaskStatus};

/// The single user action that is legal for a task's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Accept,
    Start,
    Complete,
}

impl TaskAction {
    pub fn label(self) -> &'static str {
        match self {
            TaskAction::Accept => "Accept",
            TaskAction::Start => "In Progress",
            TaskAction::Complete => "Mark Complete",
        }
    }

    /// Status the task ends up in after this action.
    pub fn target(self) -> TaskStatus {
        match self {
            TaskAction::Accept => TaskStatus::Accepted,
            TaskAction::Start => TaskStatus::InProgress,
            TaskAction::Complete => TaskStatus::Completed,
        }
    }
}

impl TaskStatus {
    /// The only legal successor, if any.
    pub const fn next(self) -> Option<TaskStatus> {
        match self {
            TaskStatus::New => Some(TaskStatus::Accepted),
            TaskStatus::Accepted => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Completed),
            TaskStatus::Completed => None,
        }
    }

    pub fn can_advance_to(self, to: TaskStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn next_action(self) -> Option<TaskAction> {
        match self {
            TaskStatus::New => Some(TaskAction::Accept),
            TaskStatus::Accepted => Some(TaskAction::Start),
            TaskStatus::InProgress => Some(TaskAction::Complete),
            TaskStatus::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TaskStatus::Completed
    }
}

impl Task {
    /// A fresh task in the `New` state.
    pub fn new(id: impl Into<String>, details: TaskDetails) -> Self {
        Self {
            id: id.into(),
            details,
            state: TaskState::New,
        }
    }

    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.details.kind()
    }

    pub fn status(&self) -> TaskStatus {
        self.state.status()
    }

    pub fn completed_at_ms(&self) -> Option<u64> {
        match self.state {
            TaskState::Completed { at_ms } => Some(at_ms),
            _ => None,
        }
    }

    pub fn next_action(&self) -> Option<TaskAction> {
        self.status().next_action()
    }

    /// Move to `to` if it is the legal successor. Completion stamps `now_ms`.
    pub fn advance_to(&mut self, to: TaskStatus, now_ms: u64) -> Result<(), TransitionError> {
        let from = self.status();
        if !from.can_advance_to(to) {
            return Err(TransitionError::Illegal {
                id: self.id.clone(),
                from,
                to,
            });
        }
        self.state = match to {
            TaskStatus::New => TaskState::New,
            TaskStatus::Accepted => TaskState::Accepted,
            TaskStatus::InProgress => TaskState::InProgress,
            TaskStatus::Completed => TaskState::Completed { at_ms: now_ms },
        };
        Ok(())
    }
}
