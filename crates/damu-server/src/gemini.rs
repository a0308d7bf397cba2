//! Text generation through the Gemini `generateContent` REST API.

use damu::error::GenerationError;
use damu::protocol::{AnalysisKind, AnalysisReport};
use serde_json::{Value, json};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gemini {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl Gemini {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// A short thank-you paragraph for `donor_name`.
    pub async fn thank_you(&self, donor_name: &str) -> Result<String, GenerationError> {
        let text = self.generate(&thank_you_prompt(donor_name), false).await?;
        Ok(text.trim().to_string())
    }

    /// Analyze a raw report and decode the model's JSON into a typed report.
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        content: &str,
    ) -> Result<AnalysisReport, GenerationError> {
        let text = self.generate(&analysis_prompt(kind, content), true).await?;
        AnalysisReport::from_model_json(kind, strip_code_fence(&text))
            .map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    async fn generate(&self, prompt: &str, json_output: bool) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::NotConfigured)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let mut body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        if json_output {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        tracing::debug!(model = %self.config.model, json_output, "calling text generation");
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| GenerationError::Upstream(format!("unreadable response: {e}")))?;
        if !status.is_success() {
            let message = payload["error"]["message"]
                .as_str()
                .unwrap_or("no error message")
                .to_string();
            return Err(GenerationError::Upstream(format!("{status}: {message}")));
        }
        extract_text(&payload).ok_or(GenerationError::EmptyResponse)
    }
}

pub fn thank_you_prompt(donor_name: &str) -> String {
    format!(
        "You are a compassionate representative of the Muainishi wa Damu Blood Donation service in Kenya. \
         Write a short, heartfelt, and inspiring thank you message to a blood donor named {donor_name}. \
         Mention the incredible impact their single donation can have, potentially saving up to three lives. \
         Keep the tone warm, personal, and encouraging. The message should be a single paragraph. \
         Do not use markdown."
    )
}

pub fn analysis_prompt(kind: AnalysisKind, content: &str) -> String {
    let (subject, shape) = match kind {
        AnalysisKind::BloodWork => (
            "a blood inventory report with one row per blood type and its unit count",
            r#"{"summary":{"totalUnits":0,"bloodTypesFound":0,"mostCommonType":"","rarestType":""},"breakdown":[{"bloodType":"","units":0,"percentage":0.0}],"insights":[""]}"#,
        ),
        AnalysisKind::Platelet => (
            "a set of platelet count samples",
            r#"{"summary":{"samplesAnalyzed":0,"averageCount":0.0,"lowCountSamples":0},"breakdown":[{"category":"","count":0,"percentage":0.0}],"insights":[""]}"#,
        ),
        AnalysisKind::WhiteCell => (
            "a white blood cell differential count",
            r#"{"summary":{"totalWbc":"","dominantCellType":""},"breakdown":[{"cellType":"","percentage":0.0,"absoluteCount":"","normalRange":""}],"insights":[""]}"#,
        ),
    };
    format!(
        "You are a haematology analyst for the Muainishi wa Damu Blood Donation service in Kenya. \
         The following delimited text is {subject}. Analyze it and answer with JSON only, \
         exactly in this shape: {shape}. Percentages are 0-100. Give two to four short insights.\n\n\
         ---\n{content}\n---"
    )
}

/// Concatenated text parts of the first candidate.
fn extract_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Models sometimes wrap JSON in a fenced block despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
