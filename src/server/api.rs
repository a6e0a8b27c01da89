//! API route definitions and handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tower_http::trace::TraceLayer;

use crate::service::{Prediction, RepresentativenessService, TrainingSpec};

use super::error::{Result, ServerError};

const AUTH_HEADER: &str = "Auth-Token";

/// Application state shared across handlers
pub struct AppState {
    pub service: Arc<RepresentativenessService>,
    pub auth_token: String,
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/train", post(train))
        .route("/status", get(status))
        .route("/predict", post(predict))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth_token,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Compare tokens through their digests so the comparison time does not
/// depend on where the strings diverge.
fn token_matches(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}

async fn require_auth_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok());
    match provided {
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": true,
                "message": format!("{AUTH_HEADER} header not provided"),
            })),
        )
            .into_response(),
        Some(token) if !token_matches(token, &state.auth_token) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": true,
                "message": format!("Invalid {AUTH_HEADER}"),
            })),
        )
            .into_response(),
        Some(_) => next.run(request).await,
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to 'Representativeness model' service."
    }))
}

/// Submit a training job. Returns the current job state immediately;
/// training runs in the background.
async fn train(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<TrainingSpec>,
) -> Result<impl IntoResponse> {
    if spec.n_split < 1 {
        return Err(ServerError::BadRequest(
            "n_split must be at least 1".to_string(),
        ));
    }
    if spec.n_nearest < 2 {
        return Err(ServerError::BadRequest(
            "n_nearest must be at least 2".to_string(),
        ));
    }
    let snapshot = state.service.submit_training(spec)?;
    Ok(Json(snapshot))
}

async fn status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    Ok(Json(state.service.status()?))
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub data: Vec<Vec<f64>>,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<impl IntoResponse> {
    let response = match state.service.predict(&request.data)? {
        Prediction::NoModel => json!({ "details": "No models trained yet" }),
        Prediction::Scores { model, prediction } => json!({
            "model": model,
            "prediction": prediction,
        }),
    };
    Ok(Json(response))
}
