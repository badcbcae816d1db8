use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors raised while validating or persisting recommendation data
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DataValidationError {
    #[error("Invalid Recommendation: body of request contained bad or no data")]
    NotAnObject,

    #[error("Invalid Recommendation: missing {0}")]
    MissingField(&'static str),

    #[error("Invalid Recommendation: {field} {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Enumeration name that does not resolve to a member
    #[error("Invalid Recommendation Type or Status : missing {value} ({field})")]
    UnknownVariant { field: &'static str, value: String },

    #[error("Recommendation must be created before it can be updated")]
    NotPersisted,

    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    /// Storage rejected a write; the transaction was rolled back
    #[error("Error persisting Recommendation: {0}")]
    Persistence(String),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    DataValidation(#[from] DataValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DataValidation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::UnsupportedMediaType(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::DataValidation(e) => e.to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                self.to_string()
            }
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Unknown"),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
