use serde_json::Value;

use crate::models::{AnswerResponse, Medication, PatientRecord, TestResult, Visit};

const NOT_FOUND_ANSWER: &str =
    "I couldn't find a specific answer to your question in your records.";

/// Deterministic answer path: keyword rules over the structured record.
///
/// Rules are evaluated in a fixed priority order and the first keyword match
/// owns the question. A rule that matches its keyword but finds no
/// qualifying records yields the default not-found response; later rules
/// are not consulted.
pub struct RuleBasedAnswerer;

impl RuleBasedAnswerer {
    pub fn evaluate(&self, question: &str, record: &PatientRecord) -> AnswerResponse {
        let question = question.to_lowercase();

        if question.contains("medication") || question.contains("taking") {
            return medications_answer(&record.medications);
        }

        if question.contains("blood test") || question.contains("last test") {
            let all: Vec<&TestResult> = record.test_results.iter().collect();
            if let Some(last) = latest_by_date(all, |t| t.date.as_str()) {
                return last_test_answer(last);
            }
            return default_answer();
        }

        if question.contains("cholesterol") {
            let matching: Vec<&TestResult> = record
                .test_results
                .iter()
                .filter(|t| t.kind.eq_ignore_ascii_case("cholesterol"))
                .collect();
            if let Some(latest) = latest_by_date(matching, |t| t.date.as_str()) {
                return cholesterol_answer(latest);
            }
            return default_answer();
        }

        if question.contains("cardiologist") || question.contains("follow up") {
            let matching: Vec<&Visit> = record
                .visits
                .iter()
                .filter(|v| v.specialist.eq_ignore_ascii_case("cardiologist"))
                .collect();
            if let Some(latest) = latest_by_date(matching, |v| v.date.as_str()) {
                return visit_answer(latest);
            }
            return default_answer();
        }

        default_answer()
    }
}

/// Stable descending sort by date string, then take the front. Among equal
/// dates the earliest-positioned record wins.
fn latest_by_date<'a, T>(mut candidates: Vec<&'a T>, date: impl Fn(&T) -> &str) -> Option<&'a T> {
    candidates.sort_by(|a, b| date(b).cmp(date(a)));
    candidates.into_iter().next()
}

fn medications_answer(medications: &[Medication]) -> AnswerResponse {
    let listing = medications
        .iter()
        .map(|m| format!("{} ({}, {})", m.name, m.dosage, m.frequency))
        .collect::<Vec<_>>()
        .join(", ");

    AnswerResponse {
        answer: format!(
            "You are currently taking {} medications: {}",
            medications.len(),
            listing
        ),
        data: Some(serde_json::to_value(medications).unwrap_or(Value::Null)),
        confidence: 0.9,
        source: None,
    }
}

fn last_test_answer(test: &TestResult) -> AnswerResponse {
    AnswerResponse {
        answer: format!(
            "Your last blood test was on {} with results: {} = {}",
            test.date,
            test.kind,
            value_text(&test.value)
        ),
        data: Some(serde_json::to_value(test).unwrap_or(Value::Null)),
        confidence: 0.85,
        source: None,
    }
}

fn cholesterol_answer(test: &TestResult) -> AnswerResponse {
    AnswerResponse {
        answer: format!(
            "Your latest cholesterol reading was {} on {}",
            value_text(&test.value),
            test.date
        ),
        data: Some(serde_json::to_value(test).unwrap_or(Value::Null)),
        confidence: 0.9,
        source: None,
    }
}

fn visit_answer(visit: &Visit) -> AnswerResponse {
    AnswerResponse {
        answer: format!(
            "Your last cardiologist visit was on {} for: {}",
            visit.date, visit.notes
        ),
        data: Some(serde_json::to_value(visit).unwrap_or(Value::Null)),
        confidence: 0.8,
        source: None,
    }
}

fn default_answer() -> AnswerResponse {
    AnswerResponse {
        answer: NOT_FOUND_ANSWER.to_string(),
        data: None,
        confidence: 0.3,
        source: None,
    }
}

/// Render a reading without JSON quoting around string values.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> PatientRecord {
        serde_json::from_value(json!({
            "medications": [
                { "name": "Lisinopril", "dosage": "10mg", "frequency": "once daily" },
                { "name": "Metformin", "dosage": "500mg", "frequency": "twice daily" }
            ],
            "test_results": [
                { "type": "Cholesterol", "value": 210, "date": "2024-01-01" },
                { "type": "Blood Glucose", "value": 105, "date": "2024-06-01" }
            ],
            "visits": [
                { "specialist": "Cardiologist", "date": "2024-02-10", "notes": "Routine follow up" },
                { "specialist": "Endocrinologist", "date": "2024-04-18", "notes": "Dosage review" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn medication_rule_lists_all_medications() {
        let record = sample_record();
        let response = RuleBasedAnswerer.evaluate("What medications am I taking?", &record);

        assert_eq!(response.confidence, 0.9);
        let data = response.data.unwrap();
        assert_eq!(data.as_array().unwrap().len(), record.medications.len());
        assert!(response.answer.contains("2 medications"));
        assert!(response.answer.contains("Lisinopril (10mg, once daily)"));
    }

    #[test]
    fn last_test_rule_picks_max_date() {
        let record = sample_record();
        let response = RuleBasedAnswerer.evaluate("when was my last test?", &record);

        assert_eq!(response.confidence, 0.85);
        assert!(response.answer.contains("2024-06-01"));
        assert!(response.answer.contains("Blood Glucose"));
    }

    #[test]
    fn tied_dates_keep_the_earlier_positioned_record() {
        let record: PatientRecord = serde_json::from_value(json!({
            "medications": [],
            "test_results": [
                { "type": "Cholesterol", "value": 210, "date": "2024-06-01" },
                { "type": "Blood Glucose", "value": 105, "date": "2024-06-01" }
            ],
            "visits": []
        }))
        .unwrap();

        let response = RuleBasedAnswerer.evaluate("show my last test", &record);
        assert!(response.answer.contains("Cholesterol"));
    }

    #[test]
    fn cholesterol_rule_picks_latest_matching_result() {
        let record: PatientRecord = serde_json::from_value(json!({
            "medications": [],
            "test_results": [
                { "type": "Cholesterol", "value": 210, "date": "2024-01-15" },
                { "type": "Blood Glucose", "value": 105, "date": "2024-03-02" },
                { "type": "Cholesterol", "value": 195, "date": "2024-05-20" }
            ],
            "visits": []
        }))
        .unwrap();

        let response = RuleBasedAnswerer.evaluate("How is my cholesterol?", &record);
        assert_eq!(response.confidence, 0.9);
        assert_eq!(
            response.answer,
            "Your latest cholesterol reading was 195 on 2024-05-20"
        );
    }

    #[test]
    fn cholesterol_rule_falls_through_when_no_results_match() {
        let record: PatientRecord = serde_json::from_value(json!({
            "medications": [],
            "test_results": [
                { "type": "Blood Glucose", "value": 105, "date": "2024-03-02" }
            ],
            "visits": []
        }))
        .unwrap();

        let response = RuleBasedAnswerer.evaluate("How is my cholesterol?", &record);
        assert_eq!(response.confidence, 0.3);
        assert!(response.data.is_none());
        assert_eq!(response.answer, NOT_FOUND_ANSWER);
    }

    #[test]
    fn matched_keyword_with_no_records_skips_later_rules() {
        // "cholesterol" owns the question even though "follow up" would have
        // matched a cardiologist visit.
        let record = sample_record();
        let stripped: PatientRecord = serde_json::from_value(json!({
            "medications": [],
            "test_results": [],
            "visits": serde_json::to_value(&record.visits).unwrap()
        }))
        .unwrap();

        let response =
            RuleBasedAnswerer.evaluate("cholesterol follow up results?", &stripped);
        assert_eq!(response.confidence, 0.3);
        assert!(response.data.is_none());
    }

    #[test]
    fn cardiologist_rule_picks_latest_visit() {
        let record: PatientRecord = serde_json::from_value(json!({
            "medications": [],
            "test_results": [],
            "visits": [
                { "specialist": "Cardiologist", "date": "2024-02-10", "notes": "Routine follow up" },
                { "specialist": "Cardiologist", "date": "2024-06-12", "notes": "Statin review" },
                { "specialist": "Endocrinologist", "date": "2024-07-01", "notes": "Unrelated" }
            ]
        }))
        .unwrap();

        let response = RuleBasedAnswerer.evaluate("When is my follow up?", &record);
        assert_eq!(response.confidence, 0.8);
        assert!(response.answer.contains("2024-06-12"));
        assert!(response.answer.contains("Statin review"));
    }

    #[test]
    fn unmatched_question_gets_default_answer() {
        let record = sample_record();
        let response = RuleBasedAnswerer.evaluate("What is my blood type?", &record);

        assert_eq!(response.confidence, 0.3);
        assert!(response.data.is_none());
        assert!(response.source.is_none());
        assert_eq!(response.answer, NOT_FOUND_ANSWER);
    }

    #[test]
    fn string_values_render_without_quotes() {
        let record: PatientRecord = serde_json::from_value(json!({
            "medications": [],
            "test_results": [
                { "type": "Hemoglobin A1C", "value": "6.1%", "date": "2024-06-01" }
            ],
            "visits": []
        }))
        .unwrap();

        let response = RuleBasedAnswerer.evaluate("show my last test", &record);
        assert!(response.answer.contains("Hemoglobin A1C = 6.1%"));
        assert!(!response.answer.contains('"'));
    }
}
