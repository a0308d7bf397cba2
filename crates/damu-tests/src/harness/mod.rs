pub mod model;
pub mod server;

use damu::dashboard::Dashboard;
use damu::query::{HttpTaskSource, fetch_all};
use damu::session::SessionStorage;

/// Run one full fetch for `dashboard` against `source`, as the TUI does.
/// Returns whether the result was applied.
pub async fn refresh<S: SessionStorage>(
    dashboard: &mut Dashboard<S>,
    source: &HttpTaskSource,
) -> bool {
    let Some(ticket) = dashboard.begin_fetch() else {
        return false;
    };
    let load = fetch_all(source).await;
    dashboard.apply_load(ticket, load)
}

/// Initialize tracing for tests (only once per process).
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("damu=debug,damu_server=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
