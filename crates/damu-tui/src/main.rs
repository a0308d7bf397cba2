mod app;
mod input;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use damu::client::ApiClient;
use damu::dashboard::{Dashboard, FetchTicket};
use damu::error::FetchError;
use damu::protocol::Task;
use damu::query::{HttpTaskSource, SimulatedTaskSource, TaskLoad, TaskSource, fetch_all};
use damu::session::{FileStorage, SessionStorage, default_session_path};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "damu-tui", about = "damu field agent dashboard")]
struct Args {
    /// Base URL of the damu API server.
    #[arg(long, env = "DAMU_API_URL", default_value = damu::DEFAULT_API_URL)]
    api_url: String,

    /// File holding the agent session.
    #[arg(long, env = "DAMU_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Use built-in demo tasks instead of the API.
    #[arg(long)]
    offline: bool,

    /// Simulated network latency for --offline, in milliseconds.
    #[arg(long, default_value_t = 600)]
    latency_ms: u64,

    /// Write logs to this file (the terminal is busy drawing).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Task source picked at startup.
enum AnySource {
    Http(HttpTaskSource),
    Simulated(SimulatedTaskSource),
}

impl TaskSource for AnySource {
    async fn fetch_active(&self) -> Result<Vec<Task>, FetchError> {
        match self {
            AnySource::Http(s) => s.fetch_active().await,
            AnySource::Simulated(s) => s.fetch_active().await,
        }
    }

    async fn fetch_completed(&self) -> Result<Vec<Task>, FetchError> {
        match self {
            AnySource::Http(s) => s.fetch_completed().await,
            AnySource::Simulated(s) => s.fetch_completed().await,
        }
    }
}

type LoadResult = (FetchTicket, TaskLoad);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_file_logging(path)?;
    }

    let (source, label) = if args.offline {
        let source = SimulatedTaskSource::demo()
            .with_latency(Duration::from_millis(args.latency_ms));
        (AnySource::Simulated(source), "offline demo".to_string())
    } else {
        let client = ApiClient::new(&args.api_url);
        (AnySource::Http(HttpTaskSource::new(client)), args.api_url.clone())
    };
    let source = Arc::new(source);

    let session_path = args.session_file.unwrap_or_else(default_session_path);
    tracing::info!(session = %session_path.display(), source = %label, "starting dashboard");
    let mut app = App::new(Dashboard::new(FileStorage::load(&session_path)), label);

    let (load_tx, mut load_rx) = mpsc::unbounded_channel::<LoadResult>();
    // A session restored from storage goes straight to loading.
    if let Some(ticket) = app.dashboard.begin_fetch() {
        spawn_fetch(source.clone(), ticket, load_tx.clone());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &source, &load_tx, &mut load_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop<S: SessionStorage>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    source: &Arc<AnySource>,
    load_tx: &mpsc::UnboundedSender<LoadResult>,
    load_rx: &mut mpsc::UnboundedReceiver<LoadResult>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            // Check keyboard events
            poll_result = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(50))) => {
                if let Ok(Ok(true)) = poll_result
                    && let Ok(Event::Key(key)) = event::read()
                    && let Some(ticket) = input::handle_key(app, key)
                {
                    spawn_fetch(source.clone(), ticket, load_tx.clone());
                }
            }

            // Finished fetches
            Some((ticket, load)) = load_rx.recv() => {
                app.apply_load(ticket, load);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Fetch both task lists in the background and hand the result to the loop.
fn spawn_fetch(source: Arc<AnySource>, ticket: FetchTicket, tx: mpsc::UnboundedSender<LoadResult>) {
    tokio::spawn(async move {
        let load = fetch_all(source.as_ref()).await;
        let _ = tx.send((ticket, load));
    });
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "damu_tui=info,damu=info".into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
