use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Vector search error: {0}")]
    VectorSearchError(String),

    #[error("Service busy: {0}")]
    Busy(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            },
            ApiError::LlmError(msg) => {
                tracing::error!("LLM error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "LlmError", msg)
            },
            ApiError::EmbeddingError(msg) => {
                tracing::error!("Embedding error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "EmbeddingError", msg)
            },
            ApiError::VectorSearchError(msg) => {
                tracing::error!("Vector search error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "VectorSearchError", msg)
            },
            ApiError::Busy(msg) => {
                tracing::warn!("Service busy: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, "Busy", msg)
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::LlmError("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::EmbeddingError("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::VectorSearchError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Busy("x".into()), StatusCode::TOO_MANY_REQUESTS),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
