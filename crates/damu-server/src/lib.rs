//! JSON API for the damu blood bank: inventory, agent tasks, donation and
//! blood request intake, and text generation.

pub mod api;
pub mod bank;
pub mod gemini;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::bank::MockBank;
use crate::gemini::Gemini;

pub struct AppState {
    pub bank: Mutex<MockBank>,
    pub gemini: Gemini,
    /// Artificial delay on task list responses.
    pub latency: Duration,
}

impl AppState {
    pub fn new(bank: MockBank, gemini: Gemini, latency: Duration) -> Self {
        Self {
            bank: Mutex::new(bank),
            gemini,
            latency,
        }
    }

    pub async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/inventory", get(api::inventory))
        .route("/api/agent-tasks", get(api::agent_tasks))
        .route("/api/agent-tasks/completed", get(api::completed_tasks))
        .route(
            "/api/donation-requests",
            post(api::create_donation).fallback(api::method_not_allowed),
        )
        .route(
            "/api/blood-requests",
            post(api::create_blood_request).fallback(api::method_not_allowed),
        )
        .route(
            "/api/thank-you",
            post(api::thank_you).fallback(api::method_not_allowed),
        )
        .route(
            "/api/analyze/{kind}",
            post(api::analyze).fallback(api::method_not_allowed),
        )
        .route("/api/health", get(api::health))
        .with_state(state)
}

/// CORS for the browser front end. A `*` entry opens the API to any origin.
pub fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }
    let allowed = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid --allow-origin value: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(allowed)))
}
