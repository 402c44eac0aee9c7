//! advisor-service-rs/lib.rs
//! Plant advisor HTTP service
//!
//! - `POST /predict`   classify four environmental features
//! - `POST /recommend` ask the language model for advice on a prediction
//! - `GET  /health`    liveness and credential status
//! - `GET  /`          service descriptor
//!
//! The two POST endpoints are independent round trips; nothing links a
//! prediction to a later recommendation on the server side.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use classifier::{Classifier, SustainabilityClass};

pub mod error;
pub mod llm_client;
pub mod recommendation;
pub mod settings;
pub mod validation;

use error::StartupError;
use llm_client::LLMClient;
use recommendation::{RecommendationError, RecommendationOutcome, RecommendationRequester};
use settings::{AdvisorSettings, ModelSource};
use validation::{json_body, parse_predict_request, parse_recommend_request, payload_limit_config};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Shared application state, built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub requester: RecommendationRequester,
}

impl AppState {
    pub fn new(classifier: Arc<Classifier>, requester: RecommendationRequester) -> Self {
        Self {
            classifier,
            requester,
        }
    }

    /// Builds the classifier and the LLM client. Any failure here is fatal.
    pub fn from_settings(settings: &AdvisorSettings) -> Result<Self, StartupError> {
        let classifier = build_classifier(settings)?;
        let client = LLMClient::new(&settings.llm)?;
        let requester = RecommendationRequester::new(Arc::new(client), settings.llm.service_name.clone());
        Ok(Self::new(Arc::new(classifier), requester))
    }
}

pub fn build_classifier(settings: &AdvisorSettings) -> Result<Classifier, StartupError> {
    let classifier = match &settings.model_source {
        ModelSource::Builtin => {
            log::info!("Fitting built-in {} classifier", settings.schema);
            Classifier::fit_builtin()?
        }
        ModelSource::Artifact(path) => {
            log::info!(
                "Loading {} classifier from {}",
                settings.schema,
                path.display()
            );
            Classifier::from_artifact(settings.schema, path)?
        }
    };
    log::info!(
        "Classifier ready: {} model, scaled input: {}",
        classifier.model_kind(),
        classifier.is_scaled()
    );
    Ok(classifier)
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: SustainabilityClass,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub uptime_seconds: i64,
    pub status: String,
    pub variant: String,
    pub llm_configured: bool,
}

/// POST /predict - Classify a feature vector
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let schema = state.classifier.schema();
    let features = match json_body(payload).and_then(|body| parse_predict_request(schema, &body)) {
        Ok(features) => features,
        Err(err) => {
            log::warn!("Rejected predict request: {}", err);
            return err.to_response().into_response();
        }
    };

    match state.classifier.classify(&features) {
        Ok(prediction) => {
            log::info!("Predict request: {:?} -> {}", features.values(), prediction);
            Json(PredictResponse { prediction }).into_response()
        }
        Err(err) => {
            log::error!("Classification failed for {:?}: {}", features.values(), err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Classification failed", "code": 500 })),
            )
                .into_response()
        }
    }
}

/// POST /recommend - Request advice for a prediction; errors are in-band
async fn recommend_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Json<RecommendationOutcome> {
    let schema = state.classifier.schema();
    let parsed = json_body(payload).and_then(|body| parse_recommend_request(schema, &body));

    let result = match parsed {
        Ok((prediction, features)) => {
            log::info!("Recommend request: prediction={}", prediction);
            state.requester.recommend(schema, prediction, &features).await
        }
        Err(err) => {
            log::warn!("Rejected recommend request: {}", err);
            Err(RecommendationError::MalformedInput(err.detail().to_string()))
        }
    };

    if let Err(err) = &result {
        log::debug!("Recommendation failed ({}): {}", err.kind(), err);
    }
    Json(RecommendationOutcome::from(result))
}

/// GET /health - Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm_configured = state.requester.is_configured();
    Json(HealthResponse {
        healthy: true,
        service_name: "advisor-service".to_string(),
        uptime_seconds: START_TIME.elapsed().as_secs() as i64,
        status: (if llm_configured { "SERVING" } else { "DEGRADED" }).to_string(),
        variant: state.classifier.schema().to_string(),
        llm_configured,
    })
}

/// GET / - Root endpoint
async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let fields: Vec<&str> = state
        .classifier
        .schema()
        .fields()
        .iter()
        .map(|field| field.key)
        .collect();
    Json(serde_json::json!({
        "service": "Plant Advisor",
        "version": env!("CARGO_PKG_VERSION"),
        "variant": state.classifier.schema().to_string(),
        "features": fields,
        "endpoints": [
            "GET /health",
            "POST /predict",
            "POST /recommend"
        ]
    }))
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found", "code": 404 })),
    )
}

/// Builds the router with CORS and the payload limit applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    let _ = *START_TIME;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .route("/recommend", post(recommend_handler))
        .fallback(not_found_handler)
        .layer(ServiceBuilder::new().layer(cors).layer(payload_limit_config()))
        .with_state(state)
}
