use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A generation or revision is already running for this document.
    #[error("Generation already in flight for document {0}")]
    GenerationInFlight(uuid::Uuid),

    /// The single free revision has already been consumed.
    #[error("Free revision already used")]
    RevisionUsed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::GenerationInFlight(id) => (
                StatusCode::CONFLICT,
                "GENERATION_IN_FLIGHT",
                format!("A generation is already running for document {id}"),
            ),
            AppError::RevisionUsed => (
                StatusCode::FORBIDDEN,
                "REVISION_USED",
                "The free revision for this document has already been used".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Workflow(msg) => {
                tracing::error!("Workflow error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "WORKFLOW_ERROR",
                    "The AI workflow service failed".to_string(),
                )
            }
            AppError::Payment(msg) => {
                tracing::error!("Payment provider error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_ERROR",
                    "The payment provider could not be reached".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
