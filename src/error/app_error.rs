use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::validation::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    ConfigError(String),
    InternalError(String),
    UploadError(String),
    NotFound,
    Validation(ValidationErrors),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "{}", e),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InternalError(msg) => write!(f, "{}", msg),
            AppError::UploadError(msg) => write!(f, "{}", msg),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Validation(errors) => write!(f, "{}", errors),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseError(sqlx::Error::Migrate(Box::new(err)))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            AppError::DatabaseError(ref e) => {
                tracing::error!("Database error: {:?}", e);
                internal_error(message)
            }
            AppError::ConfigError(_) => {
                tracing::error!("{}", message);
                internal_error(message)
            }
            AppError::InternalError(_) => {
                tracing::error!("Internal error: {}", message);
                internal_error(message)
            }
            AppError::UploadError(_) => {
                tracing::error!("Upload error: {}", message);
                internal_error(message)
            }
        }
    }
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
