use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use damu_server::bank::MockBank;
use damu_server::gemini::{Gemini, GeminiConfig};
use damu_server::{AppState, router};
use serde_json::{Value, json};

mod helpers {
    use super::*;
    use axum::Json;
    use axum::routing::post;

    /// Serve `app` on an ephemeral port and return its base URL.
    pub async fn spawn(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    /// Start the API with the given bank and generation backend.
    pub async fn start_api(bank: MockBank, gemini: GeminiConfig) -> String {
        let state = Arc::new(AppState::new(bank, Gemini::new(gemini), Duration::ZERO));
        spawn(router(state)).await
    }

    /// A fake generateContent endpoint answering every call with `text`.
    pub async fn start_model_stub(text: &'static str) -> String {
        let app = axum::Router::new().route(
            "/v1beta/models/{model}",
            post(move || async move {
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                }))
            }),
        );
        spawn(app).await
    }

    pub fn with_model(base_url: String) -> GeminiConfig {
        GeminiConfig {
            api_key: Some("test-key".into()),
            base_url,
            ..GeminiConfig::default()
        }
    }
}

async fn post_json(url: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn inventory_lists_canonical_order() {
    let base = helpers::start_api(MockBank::seeded(), GeminiConfig::default()).await;
    let body: Value = reqwest::get(format!("{base}/api/inventory"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let types: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["bloodType"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"]);
    assert_eq!(body[6]["units"], 45);
}

#[tokio::test]
async fn cors_allows_only_listed_origins() {
    let state = Arc::new(AppState::new(
        MockBank::seeded(),
        Gemini::new(GeminiConfig::default()),
        Duration::ZERO,
    ));
    let cors = damu_server::build_cors(&["http://localhost:3000".to_string()]).unwrap();
    let base = helpers::spawn(router(state).layer(cors)).await;

    let preflight = |origin: &'static str| {
        reqwest::Client::new()
            .request(
                reqwest::Method::OPTIONS,
                format!("{base}/api/donation-requests"),
            )
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .send()
    };
    let allowed = preflight("http://localhost:3000").await.unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    let denied = preflight("http://evil.example").await.unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn completed_tasks_carry_timestamps_newest_first() {
    let base = helpers::start_api(MockBank::seeded(), GeminiConfig::default()).await;
    let body: Value = reqwest::get(format!("{base}/api/agent-tasks/completed"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stamps: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["completedAtMs"].as_u64().unwrap())
        .collect();
    assert_eq!(stamps.len(), 3);
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn donation_request_echoes_and_queues_pickup() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let payload = json!({
        "donorName": "Amina Hassan",
        "bloodType": "O-",
        "donationType": "Pickup",
        "location": "Kilimani"
    });
    let (status, body) = post_json(&format!("{base}/api/donation-requests"), payload).await;
    assert_eq!(status, 201);
    assert_eq!(body["message"], "Donation request received successfully");
    assert_eq!(body["data"]["donorName"], "Amina Hassan");
    let task_id = body["taskId"].as_str().unwrap().to_string();

    let tasks: Value = reqwest::get(format!("{base}/api/agent-tasks"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tasks[0]["id"], task_id.as_str());
    assert_eq!(tasks[0]["type"], "Pickup");
    assert_eq!(tasks[0]["status"], "New");
}

#[tokio::test]
async fn center_donation_creates_no_task() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let payload = json!({
        "donorName": "Amina Hassan",
        "bloodType": "O-",
        "donationType": "At a Donation Center",
        "location": "KNH"
    });
    let (status, body) = post_json(&format!("{base}/api/donation-requests"), payload).await;
    assert_eq!(status, 201);
    assert!(body.get("taskId").is_none());
}

#[tokio::test]
async fn blank_donor_name_is_rejected() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let payload = json!({
        "donorName": "  ",
        "bloodType": "A+",
        "donationType": "Center",
        "location": "KNH"
    });
    let (status, body) = post_json(&format!("{base}/api/donation-requests"), payload).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("donorName"));
}

#[tokio::test]
async fn blood_request_units_must_be_positive_integer() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let url = format!("{base}/api/blood-requests");
    for units in [json!(0), json!(2.5), json!("2")] {
        let payload = json!({
            "hospitalName": "Nairobi Hospital",
            "bloodType": "O-",
            "units": units,
            "reason": "Emergency surgery"
        });
        let (status, body) = post_json(&url, payload).await;
        assert_eq!(status, 400, "units = {units}");
        assert!(body["error"].is_string());
    }

    let payload = json!({
        "hospitalName": "Nairobi Hospital",
        "bloodType": "O-",
        "units": 2,
        "reason": "Emergency surgery"
    });
    let (status, body) = post_json(&url, payload).await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["units"], 2);
    assert!(body["taskId"].is_string());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/blood-requests"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn wrong_method_is_405() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let resp = reqwest::get(format!("{base}/api/donation-requests"))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 405);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Method Not Allowed");
}

#[tokio::test]
async fn thank_you_without_key_is_500() {
    let base = helpers::start_api(MockBank::empty(), GeminiConfig::default()).await;
    let (status, body) =
        post_json(&format!("{base}/api/thank-you"), json!({"donorName": "Jane"})).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "API key not configured");

    let (status, _) = post_json(&format!("{base}/api/thank-you"), json!({"donorName": " "})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn thank_you_uses_model_text() {
    let model = helpers::start_model_stub("  Asante sana, Jane!  ").await;
    let base = helpers::start_api(MockBank::empty(), helpers::with_model(model)).await;
    let (status, body) =
        post_json(&format!("{base}/api/thank-you"), json!({"donorName": "Jane"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Asante sana, Jane!");
}

#[tokio::test]
async fn analysis_round_trip_through_model() {
    let model = helpers::start_model_stub(
        r#"{"summary":{"samplesAnalyzed":3,"averageCount":182.5,"lowCountSamples":1},
            "breakdown":[{"category":"Normal","count":2,"percentage":66.7},{"category":"Low","count":1,"percentage":33.3}],
            "insights":["One sample is below 150 x10^9/L."]}"#,
    )
    .await;
    let base = helpers::start_api(MockBank::empty(), helpers::with_model(model)).await;
    let client = damu::client::ApiClient::new(base);
    let report = client
        .analyze(
            damu::protocol::AnalysisKind::Platelet,
            "sample,count\n1,210\n2,190\n3,120",
        )
        .await
        .unwrap();
    match report {
        damu::protocol::AnalysisReport::Platelet(p) => {
            assert_eq!(p.summary.samples_analyzed, 3);
            assert_eq!(p.breakdown.len(), 2);
        }
        other => panic!("unexpected report {other:?}"),
    }
}

#[tokio::test]
async fn analysis_rejects_bad_input_and_bad_model_output() {
    let model = helpers::start_model_stub("this is not json").await;
    let base = helpers::start_api(MockBank::empty(), helpers::with_model(model)).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/api/analyze/red-cell"))
        .body("a,b")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = http
        .post(format!("{base}/api/analyze/blood-work"))
        .body("   ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = http
        .post(format!("{base}/api/analyze/blood-work"))
        .body("type,units\nA+,3")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
}

#[tokio::test]
async fn health_reports_task_counts() {
    let base = helpers::start_api(MockBank::seeded(), GeminiConfig::default()).await;
    let body: Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["healthy"], true);
    assert_eq!(body["activeTasks"], 3);
    assert_eq!(body["completedTasks"], 3);
    assert_eq!(body["generationConfigured"], false);
}
