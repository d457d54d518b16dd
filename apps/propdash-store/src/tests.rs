//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{router, AppState};

const KEY: &str = "test-anon-key";
const OBJECT: &str = "application/vnd.pgrst.object+json";

async fn app() -> Router {
    router(Arc::new(AppState::in_memory(KEY).await.unwrap()))
}

struct Call {
    method: &'static str,
    uri: String,
    api_key: Option<&'static str>,
    token: Option<String>,
    body: Option<Value>,
    single: bool,
}

fn call(method: &'static str, uri: impl Into<String>) -> Call {
    Call {
        method,
        uri: uri.into(),
        api_key: Some(KEY),
        token: None,
        body: None,
        single: false,
    }
}

impl Call {
    fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn single(mut self) -> Self {
        self.single = true;
        self
    }

    fn without_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    async fn send(self, app: &Router) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(key) = self.api_key {
            builder = builder.header("apikey", key);
        }
        if let Some(token) = &self.token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        if self.single {
            builder = builder
                .header("prefer", "return=representation")
                .header("accept", OBJECT);
        }
        let request = match self.body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

async fn sign_up(app: &Router) -> String {
    let (status, body) = call("POST", "/auth/v1/signup")
        .json(json!({ "email": "owner@example.com", "password": "hunter22" }))
        .send(app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["access_token"].as_str().unwrap().to_string()
}

fn property(name: &str, status: &str) -> Value {
    json!({ "name": name, "address": "12 Harbour Rd", "status": status, "rent_amount": 2400 })
}

#[tokio::test]
async fn test_health_needs_no_key() {
    let app = app().await;
    let (status, body) = call("GET", "/health").without_key().send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_rest_requires_key_and_session() {
    let app = app().await;

    let (status, body) = call("GET", "/rest/v1/properties")
        .without_key()
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_api_key");

    let (status, _) = call("GET", "/rest/v1/properties").send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call("GET", "/rest/v1/properties")
        .token(KEY)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_sign_in() {
    let app = app().await;
    sign_up(&app).await;

    let (status, body) = call("POST", "/auth/v1/token?grant_type=password")
        .json(json!({ "email": "Owner@Example.com", "password": "wrong!" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid login credentials");

    let (status, body) = call("POST", "/auth/v1/token?grant_type=password")
        .json(json!({ "email": "Owner@Example.com", "password": "hunter22" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "owner@example.com");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = call("GET", "/auth/v1/user").token(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "owner@example.com");

    let (status, _) = call("POST", "/auth/v1/logout").token(&token).send(&app).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call("GET", "/auth/v1/user").token(&token).send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_signup_and_short_password() {
    let app = app().await;
    sign_up(&app).await;

    let (status, _) = call("POST", "/auth/v1/signup")
        .json(json!({ "email": "owner@example.com", "password": "another1" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call("POST", "/auth/v1/signup")
        .json(json!({ "email": "new@example.com", "password": "12345" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_property_crud() {
    let app = app().await;
    let token = sign_up(&app).await;

    let (status, first) = call("POST", "/rest/v1/properties")
        .token(&token)
        .single()
        .json(property("Sea View", "vacant"))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(first["id"].as_str().is_some());
    assert!(first["created_at"].as_str().is_some());
    assert_eq!(first["image_url"], Value::Null);

    call("POST", "/rest/v1/properties")
        .token(&token)
        .json(property("Hill Top", "occupied"))
        .send(&app)
        .await;

    let (status, rows) = call(
        "GET",
        "/rest/v1/properties?select=*&order=created_at.desc",
    )
    .token(&token)
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Hill Top", "Sea View"]);

    let id = first["id"].as_str().unwrap();
    let (status, updated) = call("PATCH", format!("/rest/v1/properties?id=eq.{}", id))
        .token(&token)
        .single()
        .json(json!({ "status": "occupied", "id": "hijack" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "occupied");
    assert_eq!(updated["name"], "Sea View");
    assert_eq!(updated["id"], first["id"]);

    let (status, _) = call("DELETE", format!("/rest/v1/properties?id=eq.{}", id))
        .token(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, rows) = call("GET", "/rest/v1/properties")
        .token(&token)
        .send(&app)
        .await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_of_missing_row() {
    let app = app().await;
    let token = sign_up(&app).await;

    let (status, _) = call("PATCH", "/rest/v1/tenants?id=eq.nope")
        .token(&token)
        .single()
        .json(json!({ "name": "x" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

    let (status, _) = call("DELETE", "/rest/v1/tenants?id=eq.nope")
        .token(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call("DELETE", "/rest/v1/tenants")
        .token(&token)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejects_bad_input() {
    let app = app().await;
    let token = sign_up(&app).await;

    let (status, body) = call("POST", "/rest/v1/properties")
        .token(&token)
        .json(property("Sea View", "haunted"))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "check_violation");

    let (status, _) = call("POST", "/rest/v1/properties")
        .token(&token)
        .json(json!({ "name": "x", "owner": "me" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call("POST", "/rest/v1/properties")
        .token(&token)
        .json(json!({ "name": "x", "address": "y", "status": "vacant", "rent_amount": "lots" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call("GET", "/rest/v1/users").token(&token).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_maintenance_defaults_and_embed() {
    let app = app().await;
    let token = sign_up(&app).await;

    let (_, villa) = call("POST", "/rest/v1/properties")
        .token(&token)
        .single()
        .json(property("Villa", "occupied"))
        .send(&app)
        .await;

    let mut created = Vec::new();
    for property_id in [villa["id"].as_str().unwrap(), "gone"] {
        let (status, row) = call("POST", "/rest/v1/maintenance_requests")
            .token(&token)
            .single()
            .json(json!({
                "title": "Leak",
                "description": "Kitchen sink",
                "property_id": property_id,
                "priority": "high"
            }))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(row["status"], "new");
        created.push(row);
    }

    let (_, rows) = call(
        "GET",
        "/rest/v1/maintenance_requests?select=*,properties(name)&order=created_at.desc",
    )
    .token(&token)
    .send(&app)
    .await;
    assert_eq!(rows[0]["properties"], Value::Null);
    assert_eq!(rows[1]["properties"], json!({ "name": "Villa" }));

    let id = created[0]["id"].as_str().unwrap();
    let (_, updated) = call(
        "PATCH",
        format!("/rest/v1/maintenance_requests?id=eq.{}", id),
    )
    .token(&token)
    .single()
    .json(json!({ "status": "in_progress" }))
    .send(&app)
    .await;
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["title"], "Leak");
    assert!(updated["updated_at"].as_str() > created[0]["updated_at"].as_str());
}
