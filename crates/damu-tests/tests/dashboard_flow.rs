use damu::client::ApiClient;
use damu::dashboard::{Dashboard, Phase};
use damu::protocol::TaskStatus;
use damu::query::HttpTaskSource;
use damu::session::{FileStorage, MemoryStorage};
use damu_server::bank::MockBank;
use damu_server::gemini::GeminiConfig;
use damu_tests::harness::server::TestServer;
use damu_tests::harness::{init_tracing, refresh};
use std::time::Duration;

#[tokio::test]
async fn agent_works_a_task_to_completion() {
    init_tracing();
    let server = TestServer::spawn().await.unwrap();
    let source = server.task_source();
    let mut dash = Dashboard::new(MemoryStorage::default());

    let ticket = dash.login("Wanjiru").unwrap();
    assert_eq!(dash.phase(), Phase::Loading);
    let load = damu::query::fetch_all(&source).await;
    assert!(load.is_ok());
    assert!(dash.apply_load(ticket, load));
    assert_eq!(dash.phase(), Phase::Ready);
    assert_eq!(dash.store().active().len(), 3);
    assert_eq!(dash.store().completed().len(), 3);

    assert_eq!(dash.advance("TASK001", 10).unwrap(), TaskStatus::Accepted);
    assert_eq!(dash.advance("TASK001", 20).unwrap(), TaskStatus::InProgress);
    assert_eq!(dash.advance("TASK001", 30).unwrap(), TaskStatus::Completed);

    assert_eq!(dash.store().active().len(), 2);
    let newest = &dash.store().completed()[0];
    assert_eq!(newest.id, "TASK001");
    assert_eq!(newest.completed_at_ms(), Some(30));

    // Completed tasks have no further action.
    assert!(dash.advance("TASK001", 40).is_err());
    assert!(dash.advance("NOPE", 40).is_err());
}

#[tokio::test]
async fn history_arrives_newest_first() {
    let server = TestServer::spawn().await.unwrap();
    let mut dash = Dashboard::new(MemoryStorage::default());
    dash.login("Wanjiru").unwrap();
    assert!(refresh(&mut dash, &server.task_source()).await);

    let ids: Vec<&str> = dash
        .store()
        .completed()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, ["TASKC01", "TASKC02", "TASKC03"]);
}

#[tokio::test]
async fn relogin_starts_from_empty_store() {
    let server = TestServer::spawn().await.unwrap();
    let source = server.task_source();
    let mut dash = Dashboard::new(MemoryStorage::default());

    dash.login("Wanjiru").unwrap();
    refresh(&mut dash, &source).await;
    dash.advance("TASK002", 1).unwrap();

    dash.logout();
    assert_eq!(dash.phase(), Phase::Unauthenticated);
    assert!(dash.store().is_empty());
    assert!(!refresh(&mut dash, &source).await);

    let ticket = dash.login("Otieno").unwrap();
    assert!(dash.store().is_empty());
    assert!(dash.apply_load(ticket, damu::query::fetch_all(&source).await));
    let task = dash.store().get("TASK002").unwrap();
    assert_eq!(task.status(), TaskStatus::New);
}

#[tokio::test]
async fn slow_fetch_finishing_after_logout_is_ignored() {
    let server = TestServer::spawn_with(
        MockBank::seeded(),
        GeminiConfig::default(),
        Duration::from_millis(200),
    )
    .await
    .unwrap();
    let source = server.task_source();
    let mut dash = Dashboard::new(MemoryStorage::default());

    let ticket = dash.login("Wanjiru").unwrap();
    let pending = tokio::spawn(async move { damu::query::fetch_all(&source).await });
    dash.logout();

    let load = pending.await.unwrap();
    assert!(load.is_ok());
    assert!(!dash.apply_load(ticket, load));
    assert!(dash.store().is_empty());
    assert_eq!(dash.phase(), Phase::Unauthenticated);
}

#[tokio::test]
async fn unreachable_server_reports_both_lists() {
    let source = HttpTaskSource::new(ApiClient::new("http://127.0.0.1:9"));
    let mut dash = Dashboard::new(MemoryStorage::default());
    dash.login("Wanjiru").unwrap();
    assert!(refresh(&mut dash, &source).await);
    assert_eq!(dash.phase(), Phase::Error);
    let message = dash.error_message().unwrap();
    assert!(message.contains("could not load tasks"), "{message}");
    assert!(message.contains("could not load history"), "{message}");
}

#[tokio::test]
async fn session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let server = TestServer::spawn().await.unwrap();

    {
        let mut dash = Dashboard::new(FileStorage::load(&path));
        dash.login("Wanjiru").unwrap();
    }

    let mut dash = Dashboard::new(FileStorage::load(&path));
    assert_eq!(dash.agent(), Some("Wanjiru"));
    assert!(refresh(&mut dash, &server.task_source()).await);
    assert_eq!(dash.phase(), Phase::Ready);
}
