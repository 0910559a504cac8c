use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single patient's structured record, the grounding corpus for every answer.
///
/// Dates are ISO 8601 strings and are compared lexicographically; "latest"
/// selection is a string max, not calendar parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub medications: Vec<Medication>,
    pub test_results: Vec<TestResult>,
    pub visits: Vec<Visit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(rename = "type")]
    pub kind: String,
    /// Numeric or free-text reading, kept as raw JSON.
    pub value: Value,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub specialist: String,
    pub date: String,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Normalized output of both answer paths.
///
/// `data` and `source` are omitted from the wire format when absent so
/// callers never see a `null` standing in for a real value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
