use thiserror::Error;

/// Faults that surface to the HTTP caller as an `{error}` body.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Caller-correctable: empty or missing question. Maps to 400.
    #[error("{0}")]
    InvalidInput(String),

    /// Record source missing, unreadable, or failing the schema. Maps to 500.
    #[error("patient record unavailable: {0}")]
    DataUnavailable(String),
}

/// Faults inside the grounded-generation path.
///
/// These never cross the component boundary as errors: `GeminiClient`
/// absorbs them into a zero-confidence `AnswerResponse`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request timed out after {0}s")]
    Timeout(u64),

    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
}
