//! Where the dashboard's task lists come from.

use crate::client::ApiClient;
use crate::error::FetchError;
use crate::protocol::Task;
use std::future::Future;
use std::time::Duration;

/// Supplier of the active and completed task lists.
pub trait TaskSource {
    fn fetch_active(&self) -> impl Future<Output = Result<Vec<Task>, FetchError>> + Send;
    fn fetch_completed(&self) -> impl Future<Output = Result<Vec<Task>, FetchError>> + Send;
}

/// Outcome of fetching both lists. Each leg succeeds or fails on its own.
#[derive(Debug)]
pub struct TaskLoad {
    pub active: Result<Vec<Task>, FetchError>,
    pub completed: Result<Vec<Task>, FetchError>,
}

impl TaskLoad {
    pub fn is_ok(&self) -> bool {
        self.active.is_ok() && self.completed.is_ok()
    }
}

/// Fetch both lists concurrently.
pub async fn fetch_all<S: TaskSource>(source: &S) -> TaskLoad {
    let (active, completed) = tokio::join!(source.fetch_active(), source.fetch_completed());
    if let Err(e) = &active {
        tracing::warn!(error = %e, "active task fetch failed");
    }
    if let Err(e) = &completed {
        tracing::warn!(error = %e, "completed task fetch failed");
    }
    TaskLoad { active, completed }
}

/// Tasks served by the damu API.
#[derive(Debug, Clone)]
pub struct HttpTaskSource {
    client: ApiClient,
}

impl HttpTaskSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl TaskSource for HttpTaskSource {
    async fn fetch_active(&self) -> Result<Vec<Task>, FetchError> {
        self.client.active_tasks().await
    }

    async fn fetch_completed(&self) -> Result<Vec<Task>, FetchError> {
        self.client.completed_tasks().await
    }
}

/// In-memory task lists with simulated network latency and optional
/// per-list failures.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTaskSource {
    active: Vec<Task>,
    completed: Vec<Task>,
    latency: Duration,
    fail_active: Option<String>,
    fail_completed: Option<String>,
}

impl SimulatedTaskSource {
    pub fn new(active: Vec<Task>, completed: Vec<Task>) -> Self {
        Self {
            active,
            completed,
            ..Self::default()
        }
    }

    /// The demo data set.
    pub fn demo() -> Self {
        Self::new(crate::sample::active_tasks(), crate::sample::completed_tasks())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_active(mut self, reason: impl Into<String>) -> Self {
        self.fail_active = Some(reason.into());
        self
    }

    pub fn failing_completed(mut self, reason: impl Into<String>) -> Self {
        self.fail_completed = Some(reason.into());
        self
    }

    async fn respond(
        &self,
        tasks: &[Task],
        failure: &Option<String>,
    ) -> Result<Vec<Task>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match failure {
            Some(reason) => Err(FetchError::Unavailable(reason.clone())),
            None => Ok(tasks.to_vec()),
        }
    }
}

impl TaskSource for SimulatedTaskSource {
    async fn fetch_active(&self) -> Result<Vec<Task>, FetchError> {
        self.respond(&self.active, &self.fail_active).await
    }

    async fn fetch_completed(&self) -> Result<Vec<Task>, FetchError> {
        self.respond(&self.completed, &self.fail_completed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn demo_source_returns_both_lists() {
        let load = fetch_all(&SimulatedTaskSource::demo()).await;
        assert!(load.is_ok());
        assert_eq!(load.active.unwrap().len(), 3);
        assert_eq!(load.completed.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn legs_fail_independently() {
        let source = SimulatedTaskSource::demo().failing_completed("history offline");
        let load = fetch_all(&source).await;
        assert!(!load.is_ok());
        assert_eq!(load.active.unwrap().len(), 3);
        assert_eq!(
            load.completed.unwrap_err(),
            FetchError::Unavailable("history offline".into())
        );
    }

    #[tokio::test]
    async fn legs_run_concurrently() {
        let source = SimulatedTaskSource::demo().with_latency(Duration::from_millis(150));
        let started = Instant::now();
        let load = fetch_all(&source).await;
        assert!(load.is_ok());
        // Sequential legs would take at least 300ms.
        assert!(started.elapsed() < Duration::from_millis(290));
    }
}
