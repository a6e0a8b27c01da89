//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::RepscoreError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] RepscoreError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Core(err) => match err {
                RepscoreError::InvalidInput { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                // Missing or empty ensembles signal store corruption,
                // not user error.
                RepscoreError::EnsembleNotFound(_) | RepscoreError::EmptyEnsemble(_) => {
                    tracing::error!(detail = %err, "Ensemble store fault");
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
                _ => {
                    tracing::error!(detail = %err, "Internal server error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_maps_to_422() {
        let response =
            ServerError::Core(RepscoreError::InvalidInput { expected: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_store_faults_map_to_500() {
        let response =
            ServerError::Core(RepscoreError::EnsembleNotFound("tok".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
