use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid {field}: {message}")]
    FieldValidation { field: &'static str, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    InternalError,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::FieldValidation {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Mail(_)
            | AppError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Authentication(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::FieldValidation { .. } | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": "Database error occurred" })
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({ "error": "File storage error occurred" })
            }
            AppError::Mail(ref e) => {
                tracing::error!("Mail error: {}", e);
                json!({ "error": "Internal server error" })
            }
            AppError::InternalError => json!({ "error": "Internal server error" }),
            AppError::FieldValidation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            AppError::Authentication(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg) => json!({ "error": msg }),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// True when the error is a Postgres unique violation, optionally on a
/// specific constraint.
pub fn is_unique_violation(err: &AppError, constraint: Option<&str>) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => {
            db_err.is_unique_violation()
                && constraint.map_or(true, |name| db_err.constraint() == Some(name))
        }
        _ => false,
    }
}
