//! The `Entity` trait ties each record type to its table and payload types

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Remote store table names
pub mod tables {
    pub const PROPERTIES: &str = "properties";
    pub const TENANTS: &str = "tenants";
    pub const MAINTENANCE_REQUESTS: &str = "maintenance_requests";

    /// Every table the application reads or writes
    pub const ALL: [&str; 3] = [PROPERTIES, TENANTS, MAINTENANCE_REQUESTS];
}

/// A record stored in one remote table.
///
/// `id` and `created_at` are assigned by the store; clients never send them.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Table holding this entity
    const TABLE: &'static str;

    /// Lowercase human noun used in notifications ("property")
    const NOUN: &'static str;

    /// Plural noun ("properties")
    const PLURAL: &'static str;

    /// Insert payload: the record without server-assigned fields
    type New: Serialize + fmt::Debug + Send + Sync;

    /// Partial update payload; absent fields are left untouched
    type Patch: Serialize + fmt::Debug + Send + Sync;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

/// A string did not name a member of a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Uppercase the first character ("in progress" -> "In progress")
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
