//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::evaluation::EvaluationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),
    #[error("Evaluation unavailable: {0}")]
    EvaluationUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::PayloadTooLarge(detail) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                detail.clone(),
            ),
            ApiError::EvaluationUnavailable(detail) => {
                tracing::warn!(detail, "Evaluation unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "EVALUATION_UNAVAILABLE",
                    detail.clone(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

/// Every evaluation failure means no trustworthy score exists.
impl From<EvaluationError> for ApiError {
    fn from(err: EvaluationError) -> Self {
        ApiError::EvaluationUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("evaluation task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let response = ApiError::BadRequest("missing field `original`".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "missing field `original`");
    }

    #[tokio::test]
    async fn payload_too_large_returns_413() {
        let response = ApiError::PayloadTooLarge("length limit exceeded".into()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[test]
    fn every_evaluation_error_is_unavailable() {
        let errors = [
            EvaluationError::ModelNotFound("/models/model.onnx".into()),
            EvaluationError::ModelInit("bad graph".into()),
            EvaluationError::Tokenization("bad input".into()),
            EvaluationError::ReadabilityUnavailable("no scorer".into()),
        ];
        for err in errors {
            let api: ApiError = err.into();
            assert!(matches!(api, ApiError::EvaluationUnavailable(_)));
        }
    }

    #[tokio::test]
    async fn evaluation_error_returns_503() {
        let err: ApiError = EvaluationError::EmbeddingUnavailable("connection refused".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "EVALUATION_UNAVAILABLE");
    }

    #[tokio::test]
    async fn dimension_mismatch_is_unavailable() {
        let err: ApiError = EvaluationError::DimensionMismatch { left: 384, right: 768 }.into();
        assert!(matches!(err, ApiError::EvaluationUnavailable(_)));
    }

    #[tokio::test]
    async fn internal_returns_500() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        // Internal errors hide details from client
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }
}
