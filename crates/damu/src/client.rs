use crate::error::{FetchError, GenerationError, SubmitError, ValidationError};
use crate::protocol::{
    AnalysisKind, AnalysisReport, BloodRequestSubmission, DonationSubmission, ErrorBody,
    HealthStatus, Inventory, SubmissionAck, Task, ThankYouRequest, ThankYouResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Note shown when no donor name is available.
pub const GENERIC_THANK_YOU: &str = "Thank you for your incredible gift! Your donation can help save up to three lives. You are a true hero.";

/// Personalised note used whenever generation fails.
pub fn fallback_thank_you(donor_name: &str) -> String {
    format!(
        "Dear {donor_name}, thank you for your incredible gift! Your donation can help save up to three lives. You are a true hero. We appreciate you more than words can say."
    )
}

/// HTTP client for the damu API server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent(format!("damu/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn inventory(&self) -> Result<Inventory, FetchError> {
        self.get_json("/api/inventory").await
    }

    pub async fn active_tasks(&self) -> Result<Vec<Task>, FetchError> {
        self.get_json("/api/agent-tasks").await
    }

    pub async fn completed_tasks(&self) -> Result<Vec<Task>, FetchError> {
        self.get_json("/api/agent-tasks/completed").await
    }

    pub async fn health(&self) -> Result<HealthStatus, FetchError> {
        self.get_json("/api/health").await
    }

    /// Submit a donation. Invalid submissions are refused before dispatch.
    pub async fn submit_donation(
        &self,
        submission: &DonationSubmission,
    ) -> Result<SubmissionAck<DonationSubmission>, SubmitError> {
        submission.validate()?;
        self.post_submission("/api/donation-requests", submission)
            .await
    }

    /// Submit a hospital blood request. Invalid submissions are refused
    /// before dispatch.
    pub async fn submit_blood_request(
        &self,
        submission: &BloodRequestSubmission,
    ) -> Result<SubmissionAck<BloodRequestSubmission>, SubmitError> {
        submission.validate()?;
        self.post_submission("/api/blood-requests", submission)
            .await
    }

    /// Ask the server for a thank-you note. Never fails: any error yields
    /// [`fallback_thank_you`], a blank name yields [`GENERIC_THANK_YOU`].
    pub async fn thank_you_note(&self, donor_name: &str) -> String {
        let name = donor_name.trim();
        if name.is_empty() {
            return GENERIC_THANK_YOU.to_string();
        }
        match self.request_thank_you(name).await {
            Ok(message) if !message.trim().is_empty() => message.trim().to_string(),
            Ok(_) => {
                tracing::warn!("thank-you generation returned empty text, using fallback");
                fallback_thank_you(name)
            }
            Err(e) => {
                tracing::warn!(error = %e, "thank-you generation failed, using fallback");
                fallback_thank_you(name)
            }
        }
    }

    async fn request_thank_you(&self, donor_name: &str) -> Result<String, FetchError> {
        let endpoint = "/api/thank-you";
        let body = ThankYouRequest {
            donor_name: donor_name.to_string(),
        };
        let resp = self
            .http
            .post(self.url(endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;
        let resp: ThankYouResponse = decode(endpoint, resp).await?;
        Ok(resp.message)
    }

    /// Analyze a raw delimited report. Failures are surfaced, never papered
    /// over with placeholder data.
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        content: &str,
    ) -> Result<AnalysisReport, GenerationError> {
        if content.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }
        let endpoint = format!("/api/analyze/{kind}");
        let resp = self
            .http
            .post(self.url(&endpoint))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;
        match decode::<AnalysisReport>(&endpoint, resp).await {
            Ok(report) => Ok(report),
            Err(FetchError::Decode { reason, .. }) => Err(GenerationError::Malformed(reason)),
            Err(FetchError::Status { message, .. }) => Err(GenerationError::Upstream(message)),
            Err(e) => Err(GenerationError::Upstream(e.to_string())),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        let resp = self
            .http
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;
        decode(endpoint, resp).await
    }

    async fn post_submission<T: Serialize + DeserializeOwned>(
        &self,
        endpoint: &str,
        submission: &T,
    ) -> Result<SubmissionAck<T>, SubmitError> {
        let resp = self
            .http
            .post(self.url(endpoint))
            .json(submission)
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;
        match decode(endpoint, resp).await {
            Ok(ack) => Ok(ack),
            Err(FetchError::Status {
                status: 400,
                message,
                ..
            }) => Err(ValidationError::Rejected(message).into()),
            Err(e) => Err(e.into()),
        }
    }
}

fn transport(endpoint: &str, err: reqwest::Error) -> FetchError {
    FetchError::Transport {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

/// Decode a success body, or turn an error status into [`FetchError::Status`]
/// carrying the server's `{ error }` message when there is one.
async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, FetchError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| FetchError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        return Err(FetchError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str(&text).map_err(|e| FetchError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}
