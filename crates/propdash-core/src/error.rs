//! Error types for the store, session and configuration layers

use thiserror::Error;

/// Any failure talking to the remote store.
///
/// Controllers treat every variant the same way: one failure notification,
/// no retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("no row in {table} with id {id}")]
    NotFound { table: String, id: String },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Unavailable(format!("undecodable response: {}", err))
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

/// Failures from the session service
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("request failed: {0}")]
    Network(String),

    #[error("auth service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed auth response: {0}")]
    Decode(String),

    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::Decode(err.to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
