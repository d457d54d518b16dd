//! propdash store server
//!
//! A local stand-in for the hosted backend. Serves the three propdash tables
//! PostgREST-style under `/rest/v1` and a password session service under
//! `/auth/v1`, backed by SQLite.
//!
//! Every `/rest/v1` and `/auth/v1` request must carry the public `apikey`
//! header. Table access and the session endpoints also need a bearer token
//! obtained from `/auth/v1/token?grant_type=password` or `/auth/v1/signup`.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod accounts;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod query;
pub mod state;
pub mod tables;
#[cfg(test)]
mod tests;

pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let rest = Router::new()
        .route(
            "/:table",
            get(handlers::rest::list_rows)
                .post(handlers::rest::insert_row)
                .patch(handlers::rest::update_rows)
                .delete(handlers::rest::delete_rows),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    let session = Router::new()
        .route("/user", get(handlers::auth::user))
        .route("/logout", post(handlers::auth::logout))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    let auth = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/token", post(handlers::auth::token))
        .merge(session);

    let api = Router::new()
        .nest("/rest/v1", rest)
        .nest("/auth/v1", auth)
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
