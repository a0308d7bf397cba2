use anyhow::{Context, Result};
use clap::Parser;
use damu_server::bank::MockBank;
use damu_server::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, Gemini, GeminiConfig};
use damu_server::{AppState, build_cors, router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "damu-server", about = "Blood bank API for the damu dashboard and CLI")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8787")]
    listen: SocketAddr,

    /// Allowed CORS origin (repeatable, `*` for any).
    #[arg(long = "allow-origin", default_value = "http://localhost:3000")]
    allow_origins: Vec<String>,

    /// Gemini API key. Text generation endpoints fail without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Model used for text generation.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the generation API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    gemini_url: String,

    /// Delay task list responses by this many milliseconds.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Start with no inventory and no tasks.
    #[arg(long)]
    empty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "damu_server=info,damu=info".into()),
        )
        .init();

    let args = Args::parse();
    let api_key = args.gemini_api_key.or_else(|| std::env::var("API_KEY").ok());
    let gemini = Gemini::new(GeminiConfig {
        api_key,
        model: args.model,
        base_url: args.gemini_url,
    });
    if !gemini.is_configured() {
        tracing::warn!("no Gemini API key configured; thank-you and analysis endpoints will fail");
    }

    let bank = if args.empty {
        MockBank::empty()
    } else {
        MockBank::seeded()
    };
    let state = Arc::new(AppState::new(
        bank,
        gemini,
        Duration::from_millis(args.latency_ms),
    ));
    let app = router(state).layer(build_cors(&args.allow_origins)?);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind listener on {}", args.listen))?;

    tracing::info!("damu-server listening on http://{}", args.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
