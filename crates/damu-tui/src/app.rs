use damu::dashboard::{Dashboard, FetchTicket, Phase};
use damu::query::TaskLoad;
use damu::session::SessionStorage;
use damu::task::TaskAction;

/// Which list has keyboard focus on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Tasks,
    History,
}

/// The TUI application state.
pub struct App<S> {
    pub dashboard: Dashboard<S>,
    /// Agent name being typed on the login screen.
    pub login_input: String,
    pub selected: usize,
    pub history_scroll: usize,
    pub pane: Pane,
    pub status_msg: String,
    pub should_quit: bool,
    /// Where tasks come from, for the header.
    pub source_label: String,
}

impl<S: SessionStorage> App<S> {
    pub fn new(dashboard: Dashboard<S>, source_label: impl Into<String>) -> Self {
        Self {
            dashboard,
            login_input: String::new(),
            selected: 0,
            history_scroll: 0,
            pane: Pane::Tasks,
            status_msg: String::new(),
            should_quit: false,
            source_label: source_label.into(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.dashboard.phase()
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.dashboard
            .visible_active()
            .get(self.selected)
            .map(|t| t.id.as_str())
    }

    /// The action bound to Enter for the selected card.
    pub fn selected_action(&self) -> Option<TaskAction> {
        self.dashboard
            .visible_active()
            .get(self.selected)
            .and_then(|t| t.next_action())
    }

    pub fn select_prev(&mut self) {
        match self.pane {
            Pane::Tasks => self.selected = self.selected.saturating_sub(1),
            Pane::History => self.history_scroll = self.history_scroll.saturating_sub(1),
        }
    }

    pub fn select_next(&mut self) {
        match self.pane {
            Pane::Tasks => {
                if self.selected + 1 < self.dashboard.visible_active().len() {
                    self.selected += 1;
                }
            }
            Pane::History => {
                if self.history_scroll + 1 < self.dashboard.visible_completed().len() {
                    self.history_scroll += 1;
                }
            }
        }
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Tasks => Pane::History,
            Pane::History => Pane::Tasks,
        };
    }

    /// Keep the selection inside the active list after it shrinks.
    pub fn clamp_selection(&mut self) {
        let active = self.dashboard.visible_active().len();
        self.selected = self.selected.min(active.saturating_sub(1));
        let completed = self.dashboard.visible_completed().len();
        self.history_scroll = self.history_scroll.min(completed.saturating_sub(1));
    }

    /// Log in with the typed name. Returns the ticket of the fetch to start.
    pub fn submit_login(&mut self) -> Option<FetchTicket> {
        match self.dashboard.login(&self.login_input) {
            Ok(ticket) => {
                self.login_input.clear();
                self.selected = 0;
                self.history_scroll = 0;
                self.pane = Pane::Tasks;
                self.status_msg = format!(
                    "Welcome, {}",
                    self.dashboard.agent().unwrap_or_default()
                );
                Some(ticket)
            }
            Err(e) => {
                self.status_msg = format!("Error: {e}");
                None
            }
        }
    }

    pub fn refresh(&mut self) -> Option<FetchTicket> {
        let ticket = self.dashboard.begin_fetch();
        if ticket.is_some() {
            self.status_msg = "Refreshing...".to_string();
        }
        ticket
    }

    pub fn apply_load(&mut self, ticket: FetchTicket, load: TaskLoad) {
        if self.dashboard.apply_load(ticket, load) {
            self.clamp_selection();
            self.status_msg = match self.dashboard.error_message() {
                Some(_) => "Some lists failed to load. Press r to retry.".to_string(),
                None => format!(
                    "{} active, {} completed",
                    self.dashboard.store().active().len(),
                    self.dashboard.store().completed().len()
                ),
            };
        }
    }

    /// Apply the selected card's legal action.
    pub fn advance_selected(&mut self, now_ms: u64) {
        let Some(id) = self.selected_task_id().map(str::to_string) else {
            return;
        };
        match self.dashboard.advance(&id, now_ms) {
            Ok(status) => {
                self.status_msg = format!("{id} is now {status}");
                self.clamp_selection();
            }
            Err(e) => self.status_msg = format!("Error: {e}"),
        }
    }

    pub fn logout(&mut self) {
        self.dashboard.logout();
        self.selected = 0;
        self.history_scroll = 0;
        self.status_msg = "Logged out.".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damu::protocol::TaskStatus;
    use damu::query::{SimulatedTaskSource, fetch_all};
    use damu::session::MemoryStorage;

    async fn logged_in() -> App<MemoryStorage> {
        let mut app = App::new(Dashboard::new(MemoryStorage::default()), "demo");
        app.login_input = "Wanjiru".to_string();
        let ticket = app.submit_login().unwrap();
        app.apply_load(ticket, fetch_all(&SimulatedTaskSource::demo()).await);
        app
    }

    #[tokio::test]
    async fn selection_stays_in_bounds() {
        let mut app = logged_in().await;
        app.select_prev();
        assert_eq!(app.selected, 0);
        for _ in 0..10 {
            app.select_next();
        }
        assert_eq!(app.selected, 2);
        assert_eq!(app.selected_task_id(), Some("TASK003"));
    }

    #[tokio::test]
    async fn completing_last_card_clamps_selection() {
        let mut app = logged_in().await;
        app.selected = 2;
        assert_eq!(app.selected_action(), Some(TaskAction::Start));
        app.advance_selected(1);
        app.advance_selected(2);
        assert_eq!(app.dashboard.store().completed()[0].id, "TASK003");
        assert_eq!(app.selected, 1);
        assert_eq!(
            app.dashboard.store().active()[1].status(),
            TaskStatus::New
        );
    }

    #[tokio::test]
    async fn nothing_is_actionable_while_refreshing() {
        let mut app = logged_in().await;
        assert!(app.refresh().is_some());
        assert_eq!(app.selected_task_id(), None);
        assert_eq!(app.selected_action(), None);
        app.advance_selected(1);
        assert_eq!(
            app.dashboard.store().get("TASK001").unwrap().status(),
            TaskStatus::New
        );
    }

    #[test]
    fn blank_login_reports_error() {
        let mut app = App::new(Dashboard::new(MemoryStorage::default()), "demo");
        app.login_input = "   ".to_string();
        assert!(app.submit_login().is_none());
        assert!(app.status_msg.starts_with("Error:"));
        assert_eq!(app.phase(), Phase::Unauthenticated);
    }

    #[tokio::test]
    async fn logout_resets_view() {
        let mut app = logged_in().await;
        app.selected = 1;
        app.logout();
        assert_eq!(app.phase(), Phase::Unauthenticated);
        assert_eq!(app.selected, 0);
        assert!(app.refresh().is_none());
    }
}
