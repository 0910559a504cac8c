use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::config::{AnswerMode, ServiceConfig};
use crate::error::QueryError;
use crate::gemini::GeminiClient;
use crate::models::{AnswerResponse, QueryRequest};
use crate::resolver::{Answerer, AnswerResolver};
use crate::rules::RuleBasedAnswerer;
use crate::store::RecordStore;

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<AnswerResolver>,
}

/// Build the application router from configuration. The answerer for this
/// deployment is chosen here, once; there is no per-request fallback.
pub fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let store = RecordStore::new(&config.record_path);

    let answerer: Arc<dyn Answerer> = match config.answer_mode {
        AnswerMode::RuleBased => Arc::new(RuleBasedAnswerer),
        AnswerMode::Generative => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is required in generative mode"))?;
            Arc::new(GeminiClient::new(api_key, config.generation_timeout_secs)?)
        }
    };

    let app_state = AppState {
        resolver: Arc::new(AnswerResolver::new(store, answerer)),
    };

    Ok(build_router(app_state, &config.allowed_origin))
}

fn build_router(app_state: AppState, allowed_origin: &str) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/query", post(handle_query))
        .layer(cors_layer(allowed_origin))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Single allowed origin, GET/POST/OPTIONS, content-type header only.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Middleware to add a correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id)
            .unwrap_or_else(|_| HeaderValue::from_static("invalid")),
    );

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Patient Query Service",
        "version": "1.0.0",
        "description": "Answers natural-language questions about a patient's medical record",
        "endpoints": {
            "POST /api/query": "Answer a question about the patient record",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn handle_query(
    State(state): State<AppState>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<AnswerResponse> {
    let Json(request) = request.map_err(|e| {
        info!("rejected non-JSON query payload: {}", e);
        bad_request_error("Request must be JSON")
    })?;

    info!(question_length = request.question.len(), "processing query");

    match state.resolver.resolve(&request.question).await {
        Ok(response) => Ok(Json(response)),
        Err(QueryError::InvalidInput(message)) => Err(bad_request_error(&message)),
        Err(e @ QueryError::DataUnavailable(_)) => {
            error!("query failed: {}", e);
            Err(internal_error(&e.to_string()))
        }
    }
}
