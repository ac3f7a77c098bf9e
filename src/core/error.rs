use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A unique constraint backing a form field was violated on write
    #[error("Conflict on {field}: {message}")]
    UniqueViolation {
        field: &'static str,
        message: &'static str,
    },

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::UniqueViolation { message, .. } => {
                (StatusCode::CONFLICT, message.to_string(), None)
            }
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

/// Unique constraints that back a form field: constraint, field, message.
const UNIQUE_FIELDS: &[(&str, &str, &str)] = &[
    (
        "categories_name_unique",
        "name",
        "Category with this name already exists.",
    ),
    (
        "categories_slug_unique",
        "slug",
        "Category with this slug already exists.",
    ),
    (
        "feeds_feed_url_unique",
        "feed_url",
        "Feed with this URL already exists.",
    ),
    (
        "authors_username_unique",
        "username",
        "An author with this username already exists.",
    ),
];

fn unique_field(constraint: &str) -> Option<(&'static str, &'static str)> {
    UNIQUE_FIELDS
        .iter()
        .find(|(name, _, _)| *name == constraint)
        .map(|&(_, field, message)| (field, message))
}

/// Map constraint violations to client errors, everything else to `Database`.
pub fn map_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => {
                return match db_err.constraint().and_then(unique_field) {
                    Some((field, message)) => AppError::UniqueViolation { field, message },
                    None => AppError::Conflict("Record already exists".to_string()),
                };
            }
            // foreign_key_violation
            Some("23503") => {
                return AppError::BadRequest("Referenced record does not exist".to_string());
            }
            _ => {}
        }
    }

    AppError::Database(e)
}

pub type Result<T> = std::result::Result<T, AppError>;
