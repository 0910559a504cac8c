use std::path::PathBuf;

use anyhow::bail;

/// Which answer path serves this deployment. Static configuration, not a
/// runtime fallback chain: exactly one path is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    RuleBased,
    Generative,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub answer_mode: AnswerMode,
    /// Required in generative mode. Read from the environment only, never
    /// embedded in source.
    pub gemini_api_key: Option<String>,
    pub record_path: PathBuf,
    pub allowed_origin: String,
    pub generation_timeout_secs: u64,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let answer_mode = match std::env::var("ANSWER_MODE")
            .unwrap_or_else(|_| "generative".to_string())
            .as_str()
        {
            "rules" | "rule-based" => AnswerMode::RuleBased,
            "generative" => AnswerMode::Generative,
            other => bail!("unsupported ANSWER_MODE '{other}' (expected 'rules' or 'generative')"),
        };

        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        if answer_mode == AnswerMode::Generative && gemini_api_key.is_none() {
            bail!("GEMINI_API_KEY must be set when ANSWER_MODE=generative");
        }

        let record_path = std::env::var("PATIENT_DATA_PATH")
            .unwrap_or_else(|_| "mock_patient_data.json".to_string())
            .into();

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let generation_timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5001);

        Ok(Self {
            answer_mode,
            gemini_api_key,
            record_path,
            allowed_origin,
            generation_timeout_secs,
            port,
        })
    }
}
