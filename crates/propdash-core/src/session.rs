//! Session guard
//!
//! Tracks whether a user is signed in and decides what a protected route
//! shows. The state starts as [`SessionState::Loading`] until the first
//! session check resolves, so a protected route never flashes its content or
//! a redirect before the answer is known.
//!
//! ```text
//! Loading ──check: session──▶ Authenticated ──sign out──▶ Unauthenticated
//!    │                              ▲                            │
//!    └──check: none / error──▶ Unauthenticated ──sign in─────────┘
//! ```

use std::sync::Arc;
use tokio::sync::watch;

use crate::auth::{AuthService, AuthSession, AuthUser};
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated(AuthSession),
    Unauthenticated,
}

impl SessionState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::Authenticated(session) => Some(&session.user),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    SignIn,
    Dashboard,
    Properties,
    Tenants,
    Maintenance,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Home,
        Route::SignIn,
        Route::Dashboard,
        Route::Properties,
        Route::Tenants,
        Route::Maintenance,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::SignIn => "/signin",
            Route::Dashboard => "/dashboard",
            Route::Properties => "/properties",
            Route::Tenants => "/tenants",
            Route::Maintenance => "/maintenance",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Home | Route::SignIn)
    }
}

/// What a route renders for a given session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session check still in flight
    Placeholder,
    Render,
    Redirect(Route),
}

pub fn guard(state: &SessionState, route: Route) -> GuardDecision {
    if !route.is_protected() {
        return GuardDecision::Render;
    }
    match state {
        SessionState::Loading => GuardDecision::Placeholder,
        SessionState::Authenticated(_) => GuardDecision::Render,
        SessionState::Unauthenticated => GuardDecision::Redirect(Route::SignIn),
    }
}

/// Shared session state for the whole app. Subscribers see every transition.
pub struct SessionContext {
    auth: Arc<dyn AuthService>,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    /// Context in the [`SessionState::Loading`] state. Call
    /// [`refresh`](Self::refresh) to resolve it.
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self { auth, state }
    }

    /// Create a context and run the initial session check
    pub async fn start(auth: Arc<dyn AuthService>) -> Self {
        let context = Self::new(auth);
        context.refresh().await;
        context
    }

    /// Ask the session service who is signed in. A failed check counts as
    /// signed out.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> SessionState {
        self.state.send_replace(SessionState::Loading);
        let next = match self.auth.get_session().await {
            Ok(Some(session)) => SessionState::Authenticated(session),
            Ok(None) => SessionState::Unauthenticated,
            Err(err) => {
                tracing::warn!(error = %err, "session check failed");
                SessionState::Unauthenticated
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        let user = session.user.clone();
        tracing::info!(user_id = %user.id, "signed in");
        self.state.send_replace(SessionState::Authenticated(session));
        Ok(user)
    }

    /// Sign out. The local state ends up signed out even when the session
    /// service reports an error; the error is still returned.
    #[tracing::instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.auth.sign_out().await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "sign-out failed remotely");
        }
        self.state.send_replace(SessionState::Unauthenticated);
        result
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    pub fn guard(&self, route: Route) -> GuardDecision {
        guard(&self.state.borrow(), route)
    }
}
