use anyhow::Result;
use axum::Json;
use axum::routing::post;
use damu_server::gemini::GeminiConfig;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// A fake `generateContent` endpoint that answers every prompt with the
/// same text.
pub struct TestModel {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestModel {
    pub async fn spawn(reply: impl Into<String>) -> Result<Self> {
        let reply: String = reply.into();
        let app = axum::Router::new().route(
            "/v1beta/models/{model}",
            post(move || {
                let text = reply.clone();
                async move {
                    Json(json!({
                        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                    }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
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
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Generation config pointing the server at this stub.
    pub fn config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: Some("test-key".into()),
            base_url: format!("http://{}", self.addr),
            ..GeminiConfig::default()
        }
    }
}

impl Drop for TestModel {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
