//! Session endpoints under `/auth/v1`

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::accounts::{self, UserRecord};
use crate::error::ApiError;
use crate::middleware::CurrentSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub grant_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserRecord,
}

/// Register an account and sign it in
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let user = accounts::create_user(&state.db, &creds.email, &creds.password).await?;
    let access_token = accounts::open_session(&state.db, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token,
            token_type: "bearer",
            user,
        }),
    ))
}

/// Exchange email and password for an access token
pub async fn token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
    Json(creds): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    if params.grant_type.as_deref() != Some("password") {
        return Err(ApiError::BadRequest(
            "unsupported grant_type, expected password".to_string(),
        ));
    }

    let user = accounts::authenticate(&state.db, &creds.email, &creds.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    let access_token = accounts::open_session(&state.db, &user).await?;
    tracing::info!(user_id = %user.id, "signed in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        user,
    }))
}

/// The user behind the bearer token
pub async fn user(Extension(session): Extension<CurrentSession>) -> Json<UserRecord> {
    Json(session.user)
}

/// End the session behind the bearer token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<StatusCode, ApiError> {
    accounts::close_session(&state.db, &session.token).await?;
    tracing::info!(user_id = %session.user.id, "signed out");
    Ok(StatusCode::NO_CONTENT)
}
