//! HTTP client for a PostgREST-style store with a token auth service
//!
//! Every request carries the public `apikey` header. Requests are
//! authorized with the signed-in user's access token when there is one and
//! with the API key otherwise.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{AuthService, AuthSession, AuthUser};
use crate::config::StoreConfig;
use crate::error::{AuthError, ConfigError, StoreError};
use crate::store::{RemoteStore, Select};

pub const API_KEY_HEADER: &str = "apikey";

/// Ask PostgREST for a single object instead of a one-element array
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Shared connection state for [`RestStore`] and [`RestAuth`]
#[derive(Clone)]
pub struct RestClient {
    base: String,
    api_key: String,
    http: reqwest::Client,
    access_token: Arc<RwLock<Option<String>>>,
}

impl RestClient {
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|e| ConfigError::Invalid {
            name: crate::config::STORE_KEY_VAR,
            reason: e.to_string(),
        })?;
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: crate::config::STORE_URL_VAR,
                reason: e.to_string(),
            })?;

        Ok(Self {
            base: config.url.clone(),
            api_key: config.api_key.clone(),
            http,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn store(&self) -> RestStore {
        RestStore {
            client: self.clone(),
        }
    }

    pub fn auth(&self) -> RestAuth {
        RestAuth {
            client: self.clone(),
        }
    }

    /// Resume a session persisted by the caller
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token()
            .await
            .unwrap_or_else(|| self.api_key.clone());
        request.bearer_auth(token)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base, path)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "msg", alias = "error_description", alias = "error")]
    message: String,
}

/// Pull a readable message out of a failed response
async fn failure_message(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    (status, message)
}

async fn check(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = failure_message(response).await;
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

fn eq_filter(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

/// Table access over `/rest/v1`
#[derive(Clone)]
pub struct RestStore {
    client: RestClient,
}

#[async_trait]
impl RemoteStore for RestStore {
    #[tracing::instrument(skip(self, query), fields(table = query.table), err)]
    async fn select(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        let request = self
            .client
            .http
            .get(self.client.table_url(query.table))
            .query(&[
                ("select", query.select_param()),
                ("order", query.order_param()),
            ]);
        let response = self.client.authorized(request).await.send().await?;
        Ok(check(response).await?.json::<Vec<Value>>().await?)
    }

    #[tracing::instrument(skip(self, row), err)]
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let request = self
            .client
            .http
            .post(self.client.table_url(table))
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&row);
        let response = self.client.authorized(request).await.send().await?;
        Ok(check(response).await?.json::<Value>().await?)
    }

    #[tracing::instrument(skip(self, patch), err)]
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
        let request = self
            .client
            .http
            .patch(self.client.table_url(table))
            .query(&eq_filter(id))
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&patch);
        let response = self.client.authorized(request).await.send().await?;

        // PostgREST answers 406 when a single-object update matched no row
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE
        ) {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(check(response).await?.json::<Value>().await?)
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .http
            .delete(self.client.table_url(table))
            .query(&eq_filter(id));
        let response = self.client.authorized(request).await.send().await?;
        check(response).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Session service over `/auth/v1`
#[derive(Clone)]
pub struct RestAuth {
    client: RestClient,
}

#[async_trait]
impl AuthService for RestAuth {
    #[tracing::instrument(skip(self), err)]
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(token) = self.client.access_token().await else {
            return Ok(None);
        };

        let response = self
            .client
            .http
            .get(self.client.auth_url("user"))
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("stored access token rejected, dropping it");
            self.client.set_access_token(None).await;
            return Ok(None);
        }
        if !response.status().is_success() {
            let (status, message) = failure_message(response).await;
            return Err(AuthError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let user = response.json::<AuthUser>().await?;
        Ok(Some(AuthSession {
            access_token: token,
            user,
        }))
    }

    #[tracing::instrument(skip(self, password), err)]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .http
            .post(self.client.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(AuthError::InvalidCredentials)
            }
            _ => {
                let (status, message) = failure_message(response).await;
                return Err(AuthError::Status {
                    status: status.as_u16(),
                    message,
                });
            }
        }

        let token = response.json::<TokenResponse>().await?;
        self.client
            .set_access_token(Some(token.access_token.clone()))
            .await;
        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user,
        })
    }

    #[tracing::instrument(skip(self), err)]
    async fn sign_out(&self) -> Result<(), AuthError> {
        // The local session ends no matter what the server says
        let Some(token) = self.client.access_token.write().await.take() else {
            return Ok(());
        };

        let response = self
            .client
            .http
            .post(self.client.auth_url("logout"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = failure_message(response).await;
            return Err(AuthError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
