//! The remote store as consumed by the query interface
//!
//! Rows cross this boundary as JSON objects. The store assigns `id` and
//! `created_at` on insert and returns the full row from insert and update.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use propdash_types::tables;

/// Sort applied to a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// A to-one relation pulled into each row under the related table's name,
/// e.g. `properties(name)` on maintenance requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embed {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub columns: &'static [&'static str],
}

/// Maintenance requests embed their property's name
pub const PROPERTY_NAME_EMBED: Embed = Embed {
    table: tables::PROPERTIES,
    foreign_key: "property_id",
    columns: &["name"],
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: &'static str,
    pub embed: Option<Embed>,
    pub order: Order,
}

impl Select {
    /// All rows of `table`, newest first
    pub fn newest_first(table: &'static str) -> Self {
        Self {
            table,
            embed: None,
            order: Order {
                column: "created_at",
                descending: true,
            },
        }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    /// PostgREST `select` parameter: `*` or `*,properties(name)`
    pub fn select_param(&self) -> String {
        match &self.embed {
            Some(embed) => format!("*,{}({})", embed.table, embed.columns.join(",")),
            None => "*".to_string(),
        }
    }

    /// PostgREST `order` parameter, e.g. `created_at.desc`
    pub fn order_param(&self) -> String {
        let direction = if self.order.descending { "desc" } else { "asc" };
        format!("{}.{}", self.order.column, direction)
    }
}

/// Table-scoped CRUD against the remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List rows in the requested order, with the embed applied
    async fn select(&self, query: &Select) -> Result<Vec<Value>, StoreError>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    /// Apply a partial update to one row and return it as stored
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError>;

    /// Delete one row; deleting an id that does not exist is not an error
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}
