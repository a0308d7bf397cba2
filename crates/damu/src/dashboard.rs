//! Agent dashboard state: session gate plus task store plus load state.

use crate::error::{TransitionError, ValidationError};
use crate::protocol::{Task, TaskStatus};
use crate::query::TaskLoad;
use crate::session::{SessionGate, SessionStorage};
use crate::store::TaskStore;
use crate::view::DashboardView;

/// Load state of one task list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Coarse dashboard phase, derived from the session and both list states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unauthenticated,
    Loading,
    Ready,
    Error,
}

/// Identifies one fetch. Results are only applied if no newer fetch, login
/// or logout happened since the ticket was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
}

#[derive(Debug)]
pub struct Dashboard<S> {
    gate: SessionGate<S>,
    store: TaskStore,
    active_state: ListState,
    history_state: ListState,
    epoch: u64,
}

impl<S: SessionStorage> Dashboard<S> {
    pub fn new(storage: S) -> Self {
        Self {
            gate: SessionGate::new(storage),
            store: TaskStore::new(),
            active_state: ListState::Idle,
            history_state: ListState::Idle,
            epoch: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if !self.gate.is_authenticated() {
            return Phase::Unauthenticated;
        }
        let states = [&self.active_state, &self.history_state];
        if states
            .iter()
            .any(|s| matches!(s, ListState::Idle | ListState::Loading))
        {
            Phase::Loading
        } else if states.iter().any(|s| matches!(s, ListState::Failed(_))) {
            Phase::Error
        } else {
            Phase::Ready
        }
    }

    pub fn agent(&self) -> Option<&str> {
        self.gate.current_agent()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn active_state(&self) -> &ListState {
        &self.active_state
    }

    pub fn history_state(&self) -> &ListState {
        &self.history_state
    }

    /// Active tasks as displayed. Empty while the active list is loading or
    /// failed, so cards, markers and actions all disappear together.
    pub fn visible_active(&self) -> &[Task] {
        match self.active_state {
            ListState::Loaded => self.store.active(),
            _ => &[],
        }
    }

    /// Completed tasks as displayed, gated on the history list the same way.
    pub fn visible_completed(&self) -> &[Task] {
        match self.history_state {
            ListState::Loaded => self.store.completed(),
            _ => &[],
        }
    }

    pub fn view(&self) -> DashboardView {
        DashboardView::new(self.visible_active(), self.visible_completed())
    }

    /// Banner text for whichever lists failed to load.
    pub fn error_message(&self) -> Option<String> {
        let failures: Vec<String> = [
            ("tasks", &self.active_state),
            ("history", &self.history_state),
        ]
        .into_iter()
        .filter_map(|(what, state)| match state {
            ListState::Failed(reason) => Some(format!("could not load {what}: {reason}")),
            _ => None,
        })
        .collect();
        (!failures.is_empty()).then(|| failures.join("; "))
    }

    /// Admit an agent. Starts from an empty store and returns the ticket for
    /// the initial fetch.
    pub fn login(&mut self, name: &str) -> Result<FetchTicket, ValidationError> {
        self.gate.login(name)?;
        self.store.clear();
        Ok(self.start_fetch())
    }

    /// Mark both lists loading. `None` when nobody is logged in.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        self.gate.is_authenticated().then(|| self.start_fetch())
    }

    fn start_fetch(&mut self) -> FetchTicket {
        self.epoch += 1;
        self.active_state = ListState::Loading;
        self.history_state = ListState::Loading;
        FetchTicket { epoch: self.epoch }
    }

    /// Apply a finished fetch. Returns false if the ticket is stale.
    pub fn apply_load(&mut self, ticket: FetchTicket, load: TaskLoad) -> bool {
        if ticket.epoch != self.epoch || !self.gate.is_authenticated() {
            tracing::debug!(
                ticket = ticket.epoch,
                current = self.epoch,
                "ignoring stale task load"
            );
            return false;
        }
        // Completed first so the active leg is filtered against fresh history.
        match load.completed {
            Ok(tasks) => {
                self.store.replace_completed(tasks);
                self.history_state = ListState::Loaded;
            }
            Err(e) => self.history_state = ListState::Failed(e.to_string()),
        }
        match load.active {
            Ok(tasks) => {
                self.store.replace_active(tasks);
                self.active_state = ListState::Loaded;
            }
            Err(e) => self.active_state = ListState::Failed(e.to_string()),
        }
        tracing::debug!(
            active = self.store.active().len(),
            completed = self.store.completed().len(),
            "task load applied"
        );
        true
    }

    /// Advance a task by its single legal action.
    /// Only tasks on the displayed list can be advanced.
    pub fn advance(&mut self, id: &str, now_ms: u64) -> Result<TaskStatus, TransitionError> {
        if !self.visible_active().iter().any(|t| t.id == id) {
            tracing::warn!(task_id = %id, state = ?self.active_state, "task is not on the displayed list");
            return Err(TransitionError::NotDisplayed(id.to_string()));
        }
        match self.store.advance(id, now_ms) {
            Ok(status) => {
                tracing::info!(task_id = %id, %status, "task advanced");
                Ok(status)
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "task transition rejected");
                Err(e)
            }
        }
    }

    /// Forget the agent and everything loaded for them.
    pub fn logout(&mut self) {
        self.gate.logout();
        self.store.clear();
        self.active_state = ListState::Idle;
        self.history_state = ListState::Idle;
        self.epoch += 1;
    }
}
