use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::QueryError;
use crate::gemini::GeminiClient;
use crate::models::{AnswerResponse, PatientRecord};
use crate::rules::RuleBasedAnswerer;
use crate::store::RecordStore;

/// One answer path. Implementations never fail: a path that cannot produce
/// a real answer still returns a response (with degraded confidence).
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, question: &str, record: &PatientRecord) -> AnswerResponse;

    fn name(&self) -> &'static str;
}

#[async_trait]
impl Answerer for RuleBasedAnswerer {
    async fn answer(&self, question: &str, record: &PatientRecord) -> AnswerResponse {
        self.evaluate(question, record)
    }

    fn name(&self) -> &'static str {
        "rule-based"
    }
}

#[async_trait]
impl Answerer for GeminiClient {
    async fn answer(&self, question: &str, record: &PatientRecord) -> AnswerResponse {
        self.grounded_answer(question, record).await
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

/// Composition point: validates the question, loads the record, and
/// delegates to the single configured answerer.
pub struct AnswerResolver {
    store: RecordStore,
    answerer: Arc<dyn Answerer>,
}

impl AnswerResolver {
    pub fn new(store: RecordStore, answerer: Arc<dyn Answerer>) -> Self {
        Self { store, answerer }
    }

    pub async fn resolve(&self, question: &str) -> Result<AnswerResponse, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::InvalidInput("Question is required".to_string()));
        }

        // Reloaded per call so every resolution sees current data.
        let record = self.store.load().await?;

        info!(path = self.answerer.name(), "resolving question");
        Ok(self.answerer.answer(question, &record).await)
    }
}
