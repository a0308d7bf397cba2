use anyhow::Result;
use damu::client::ApiClient;
use damu::query::HttpTaskSource;
use damu_server::bank::MockBank;
use damu_server::gemini::{Gemini, GeminiConfig};
use damu_server::{AppState, router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// The damu API on a random local port, shut down on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Seeded bank, no text model.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(MockBank::seeded(), GeminiConfig::default(), Duration::ZERO).await
    }

    pub async fn spawn_with(
        bank: MockBank,
        gemini: GeminiConfig,
        latency: Duration,
    ) -> Result<Self> {
        let state = Arc::new(AppState::new(bank, Gemini::new(gemini), latency));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url())
    }

    pub fn task_source(&self) -> HttpTaskSource {
        HttpTaskSource::new(self.client())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
