//! HTTP handlers for the store server

pub mod auth;
pub mod rest;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
