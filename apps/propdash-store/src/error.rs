//! Error types for the store server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::password::CredentialError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No API key found in request")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Missing or invalid access token")]
    Unauthorized,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    UserExists,

    #[error("Relation {0} does not exist")]
    UnknownTable(String),

    #[error("JSON object requested, but no row matched")]
    NoRows,

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Hash(reason) => ApiError::Internal(anyhow::anyhow!(reason)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingApiKey | ApiError::InvalidApiKey => {
                (StatusCode::UNAUTHORIZED, "invalid_api_key")
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "bad_jwt"),
            ApiError::InvalidCredentials => (StatusCode::BAD_REQUEST, "invalid_grant"),
            ApiError::UserExists => (StatusCode::UNPROCESSABLE_ENTITY, "user_already_exists"),
            ApiError::UnknownTable(_) => (StatusCode::NOT_FOUND, "unknown_relation"),
            ApiError::NoRows => (StatusCode::NOT_ACCEPTABLE, "no_rows"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Database(e) => match e.as_database_error().map(|d| d.kind()) {
                Some(ErrorKind::UniqueViolation) => (StatusCode::CONFLICT, "unique_violation"),
                Some(ErrorKind::NotNullViolation) => (StatusCode::BAD_REQUEST, "not_null_violation"),
                Some(ErrorKind::CheckViolation) => (StatusCode::BAD_REQUEST, "check_violation"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            ApiError::Database(e) if status.is_server_error() => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            ApiError::Database(e) => e
                .as_database_error()
                .map(|d| d.message().to_string())
                .unwrap_or_else(|| e.to_string()),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "message": message,
            "code": code,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
