//! The session service as consumed by the session guard

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// The current session, or `None` when nobody is signed in
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// End the current session. Implementations drop their local credentials
    /// even when the remote call fails.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
