//! State synchronization core for the propdash dashboard
//!
//! Keeps per-screen view state consistent with a remote relational store:
//!
//! - [`store`] / [`auth`]: the narrow traits through which the remote store
//!   and its session service are consumed
//! - [`rest`]: PostgREST-style HTTP implementation of both traits
//! - [`memory`]: in-process implementation with the same semantics
//! - [`queries`]: typed list/create/update/delete per entity
//! - [`controller`]: per-screen collections with fenced reloads and
//!   mutation handlers that report through [`notify`]
//! - [`dashboard`]: derived statistics and display rows
//! - [`session`]: the session guard state machine

pub mod auth;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod memory;
pub mod notify;
pub mod queries;
pub mod rest;
pub mod session;
pub mod store;

pub use auth::{AuthService, AuthSession, AuthUser};
pub use config::StoreConfig;
pub use controller::{
    DashboardController, MaintenanceController, Outcome, PropertiesController,
    TenantsController, ViewController,
};
pub use error::{AuthError, ConfigError, StoreError};
pub use memory::{MemoryAuth, MemoryStore};
pub use notify::{Notification, Notifier, Variant};
pub use queries::Queries;
pub use rest::RestClient;
pub use session::{GuardDecision, Route, SessionContext, SessionState};
pub use store::RemoteStore;
