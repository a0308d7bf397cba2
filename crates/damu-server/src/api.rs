use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;

use damu::error::{GenerationError, ValidationError};
use damu::protocol::{
    AnalysisKind, AnalysisReport, BloodRequestSubmission, DonationSubmission, ErrorBody,
    HealthStatus, Inventory, SubmissionAck, Task, ThankYouResponse,
};
use damu::validation;

use crate::AppState;

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn bad_request(err: ValidationError) -> ApiError {
    error(StatusCode::BAD_REQUEST, err.to_string())
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| bad_request(ValidationError::Malformed(e.to_string())))
}

/// GET /api/inventory
pub async fn inventory(State(state): State<Arc<AppState>>) -> Json<Inventory> {
    Json(state.bank.lock().await.inventory().clone())
}

/// GET /api/agent-tasks
pub async fn agent_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    state.simulate_latency().await;
    Json(state.bank.lock().await.active_tasks().to_vec())
}

/// GET /api/agent-tasks/completed
pub async fn completed_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    state.simulate_latency().await;
    Json(state.bank.lock().await.completed_tasks().to_vec())
}

/// POST /api/donation-requests
pub async fn create_donation(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmissionAck<DonationSubmission>>), ApiError> {
    let submission = validation::parse_donation(&parse_body(&body)?).map_err(bad_request)?;
    let task_id = state
        .bank
        .lock()
        .await
        .record_donation(&submission, damu::now_ms());
    tracing::info!(
        donor = %submission.donor_name,
        blood_type = %submission.blood_type,
        task_id = task_id.as_deref().unwrap_or("-"),
        "donation request received"
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmissionAck {
            message: "Donation request received successfully".to_string(),
            data: submission,
            task_id,
        }),
    ))
}

/// POST /api/blood-requests
pub async fn create_blood_request(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmissionAck<BloodRequestSubmission>>), ApiError> {
    let submission = validation::parse_blood_request(&parse_body(&body)?).map_err(bad_request)?;
    let task_id = state.bank.lock().await.record_blood_request(&submission);
    tracing::info!(
        hospital = %submission.hospital_name,
        blood_type = %submission.blood_type,
        units = submission.units,
        %task_id,
        "blood request received"
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmissionAck {
            message: "Blood request received successfully".to_string(),
            data: submission,
            task_id: Some(task_id),
        }),
    ))
}

/// POST /api/thank-you
pub async fn thank_you(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ThankYouResponse>, ApiError> {
    let request = validation::parse_thank_you(&parse_body(&body)?).map_err(bad_request)?;
    match state.gemini.thank_you(request.donor_name.trim()).await {
        Ok(message) => Ok(Json(ThankYouResponse { message })),
        Err(GenerationError::NotConfigured) => Err(error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "API key not configured",
        )),
        Err(e) => {
            tracing::warn!(error = %e, "thank-you generation failed");
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate thank you note",
            ))
        }
    }
}

/// POST /api/analyze/{kind} - body is the raw report text.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: String,
) -> Result<Json<AnalysisReport>, ApiError> {
    let kind: AnalysisKind = kind
        .parse()
        .map_err(|e: String| error(StatusCode::BAD_REQUEST, e))?;
    if body.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "report body is empty"));
    }
    match state.gemini.analyze(kind, &body).await {
        Ok(report) => Ok(Json(report)),
        Err(GenerationError::NotConfigured) => Err(error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "API key not configured",
        )),
        Err(e) => {
            tracing::warn!(%kind, error = %e, "report analysis failed");
            Err(error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let bank = state.bank.lock().await;
    Json(HealthStatus {
        healthy: true,
        active_tasks: bank.active_tasks().len(),
        completed_tasks: bank.completed_tasks().len(),
        generation_configured: state.gemini.is_configured(),
    })
}

/// Any method other than the one a route accepts.
pub async fn method_not_allowed() -> ApiError {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}
