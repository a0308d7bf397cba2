use crate::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use damu::dashboard::{FetchTicket, Phase};
use damu::session::SessionStorage;

/// Handle a key event. Returns a ticket when a task fetch should be started.
pub fn handle_key<S: SessionStorage>(app: &mut App<S>, key: KeyEvent) -> Option<FetchTicket> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return None;
    }

    if app.phase() == Phase::Unauthenticated {
        return handle_login_key(app, key);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.should_quit = true;
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_prev();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next();
            None
        }
        KeyCode::Tab => {
            app.toggle_pane();
            None
        }
        // Only the card's single legal action is bound.
        KeyCode::Enter | KeyCode::Char(' ') => {
            if app.selected_action().is_some() {
                app.advance_selected(damu::now_ms());
            }
            None
        }
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('l') => {
            app.logout();
            None
        }
        _ => None,
    }
}

fn handle_login_key<S: SessionStorage>(app: &mut App<S>, key: KeyEvent) -> Option<FetchTicket> {
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            None
        }
        KeyCode::Enter => app.submit_login(),
        KeyCode::Backspace => {
            app.login_input.pop();
            None
        }
        KeyCode::Char(c) => {
            app.login_input.push(c);
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damu::dashboard::Dashboard;
    use damu::session::MemoryStorage;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App<MemoryStorage>, s: &str) {
        for c in s.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn login_screen_captures_text() {
        let mut app = App::new(Dashboard::new(MemoryStorage::default()), "demo");
        type_str(&mut app, "qlj");
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.login_input, "ql");
        assert!(!app.should_quit);
    }

    #[test]
    fn enter_logs_in_and_requests_fetch() {
        let mut app = App::new(Dashboard::new(MemoryStorage::default()), "demo");
        type_str(&mut app, "Otieno");
        let ticket = handle_key(&mut app, key(KeyCode::Enter));
        assert!(ticket.is_some());
        assert_eq!(app.dashboard.agent(), Some("Otieno"));
        assert_eq!(app.phase(), Phase::Loading);
    }

    #[test]
    fn dashboard_keys() {
        let mut app = App::new(Dashboard::new(MemoryStorage::default()), "demo");
        type_str(&mut app, "Otieno");
        handle_key(&mut app, key(KeyCode::Enter));

        assert!(handle_key(&mut app, key(KeyCode::Char('r'))).is_some());
        handle_key(&mut app, key(KeyCode::Char('l')));
        assert_eq!(app.phase(), Phase::Unauthenticated);

        type_str(&mut app, "A");
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let mut app = App::new(Dashboard::new(MemoryStorage::default()), "demo");
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
