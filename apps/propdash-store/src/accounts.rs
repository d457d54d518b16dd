//! Users and their sessions

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::ApiError;
use crate::password::{self, Credentials};
use crate::state::timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
}

#[derive(FromRow)]
struct StoredUser {
    id: String,
    email: String,
    password_hash: String,
}

pub async fn create_user(
    db: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<UserRecord, ApiError> {
    let credentials = Credentials::for_signup(email, password)?;

    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        email: credentials.email,
    };
    let inserted = sqlx::query(
        "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&credentials.password_hash)
    .bind(timestamp())
    .execute(db)
    .await;

    match inserted {
        Ok(_) => {
            tracing::info!(user_id = %user.id, "user created");
            Ok(user)
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(ApiError::UserExists),
        Err(e) => Err(e.into()),
    }
}

/// The user for these credentials, if they match
pub async fn authenticate(
    db: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<UserRecord>, ApiError> {
    let stored: Option<StoredUser> =
        sqlx::query_as("SELECT id, email, password_hash FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(db)
            .await?;

    Ok(stored
        .filter(|u| password::matches(password, &u.password_hash))
        .map(|u| UserRecord {
            id: u.id,
            email: u.email,
        }))
}

pub async fn open_session(db: &SqlitePool, user: &UserRecord) -> Result<String, ApiError> {
    let token = password::new_session_token();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(&user.id)
        .bind(timestamp())
        .execute(db)
        .await?;
    Ok(token)
}

pub async fn session_user(db: &SqlitePool, token: &str) -> Result<Option<UserRecord>, ApiError> {
    let user: Option<UserRecord> = sqlx::query_as(
        r#"
        SELECT u.id, u.email
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn close_session(db: &SqlitePool, token: &str) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}
