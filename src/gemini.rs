use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::error::GenerationError;
use crate::models::{AnswerResponse, PatientRecord};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-2.0-flash";
const SOURCE_LABEL: &str = "Google Gemini";

/// Client for the Gemini `generateContent` API.
///
/// Constructed once at startup and injected into the resolver. The one
/// hardening applied over the reference behavior is a request timeout, so a
/// hung upstream call cannot block a resolution indefinitely. A timed-out or
/// otherwise failed call is absorbed at this boundary into a
/// zero-confidence answer; no generation fault ever crosses it as an error.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    endpoint: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs,
        })
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Grounded answer to `question` from `record`. Infallible by contract:
    /// failures become `{answer: "Error: ...", confidence: 0.0}`.
    pub async fn grounded_answer(
        &self,
        question: &str,
        record: &PatientRecord,
    ) -> AnswerResponse {
        match self.generate(question, record).await {
            Ok(response) => {
                info!(confidence = response.confidence, "generation completed");
                response
            }
            Err(e) => {
                error!("generation failed: {}", e);
                AnswerResponse {
                    answer: format!("Error: {}", e),
                    data: None,
                    confidence: 0.0,
                    source: None,
                }
            }
        }
    }

    async fn generate(
        &self,
        question: &str,
        record: &PatientRecord,
    ) -> Result<AnswerResponse, GenerationError> {
        let prompt = build_prompt(question, record);
        let url = format!("{}/models/{}:generateContent", self.endpoint, MODEL);

        // Single attempt, no retry. The client timeout bounds the call.
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout_secs)
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Transport(format!(
                "generation service returned HTTP {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        Ok(AnswerResponse {
            answer: extract_answer(&payload)?,
            data: None,
            confidence: confidence_from(&payload),
            source: Some(SOURCE_LABEL.to_string()),
        })
    }
}

fn build_prompt(question: &str, record: &PatientRecord) -> String {
    let data = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are a medical assistant. Answer the patient's question using ONLY the following data.\n\n\
         PATIENT DATA:\n{data}\n\n\
         QUESTION: {question}\n\n\
         RULES:\n\
         - Be concise and factual\n\
         - If information isn't available, say \"Not in records\"\n\
         - Never invent data"
    )
}

fn extract_answer(payload: &Value) -> Result<String, GenerationError> {
    let text = payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| {
            GenerationError::MalformedResponse("no candidate text in response".to_string())
        })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "empty candidate text in response".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// exp(avgLogprobs) maps the reported average per-token log-probability in
/// (-inf, 0] onto (0, 1]. Missing field means 0.0, rounded to 2 decimals.
fn confidence_from(payload: &Value) -> f64 {
    match payload["candidates"][0]["avgLogprobs"].as_f64() {
        Some(avg_logprob) => round2(avg_logprob.exp().min(1.0)),
        None => 0.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
