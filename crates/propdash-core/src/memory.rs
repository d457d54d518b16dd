//! In-process store and session service
//!
//! Same observable semantics as the hosted backend: server-assigned ids and
//! timestamps, newest-first listing, partial updates that bump `updated_at`
//! where the table has one, and the `properties(name)` embed. Failure
//! injection lets tests exercise the error paths of the controllers.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{AuthService, AuthSession, AuthUser};
use crate::error::{AuthError, StoreError};
use crate::store::{Embed, RemoteStore, Select};
use propdash_types::tables;

type Row = Map<String, Value>;

struct Tables {
    rows: HashMap<&'static str, Vec<Row>>,
    last_stamp: DateTime<Utc>,
}

impl Tables {
    fn table(&self, name: &str) -> Result<&Vec<Row>, StoreError> {
        self.rows
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Vec<Row>, StoreError> {
        self.rows
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    /// Strictly increasing timestamps keep newest-first ordering total
    fn next_stamp(&mut self) -> Value {
        let mut now = Utc::now();
        if now <= self.last_stamp {
            now = self.last_stamp + Duration::microseconds(1);
        }
        self.last_stamp = now;
        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    failures: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let rows = tables::ALL.iter().map(|t| (*t, Vec::new())).collect();
        Self {
            tables: RwLock::new(Tables {
                rows,
                last_stamp: DateTime::<Utc>::MIN_UTC,
            }),
            failures: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` calls fail with [`StoreError::Unavailable`]
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .table(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

fn has_updated_at(table: &str) -> bool {
    table == tables::MAINTENANCE_REQUESTS
}

fn as_object(value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Status {
            status: 400,
            message: format!("expected a JSON object, got {}", other),
        }),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(_), None) => CmpOrdering::Greater,
        (None, Some(_)) => CmpOrdering::Less,
        _ => CmpOrdering::Equal,
    }
}

fn embedded(tables: &Tables, row: &Row, embed: &Embed) -> Result<Value, StoreError> {
    let Some(key) = row.get(embed.foreign_key).and_then(Value::as_str) else {
        return Ok(Value::Null);
    };
    let related = tables
        .table(embed.table)?
        .iter()
        .find(|r| r.get("id").and_then(Value::as_str) == Some(key));

    Ok(match related {
        Some(related) => Value::Object(
            embed
                .columns
                .iter()
                .map(|c| (c.to_string(), related.get(*c).cloned().unwrap_or(Value::Null)))
                .collect(),
        ),
        None => Value::Null,
    })
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        self.take_failure()?;
        let tables = self.tables.read().await;

        let mut rows: Vec<Row> = tables.table(query.table)?.clone();
        rows.sort_by(|a, b| {
            let ord = compare(a.get(query.order.column), b.get(query.order.column));
            if query.order.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        rows.into_iter()
            .map(|mut row| {
                if let Some(embed) = &query.embed {
                    let value = embedded(&tables, &row, embed)?;
                    row.insert(embed.table.to_string(), value);
                }
                Ok(Value::Object(row))
            })
            .collect()
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        self.take_failure()?;
        let mut row = as_object(row)?;
        let mut tables = self.tables.write().await;
        tables.table(table)?;

        let stamp = tables.next_stamp();
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        if has_updated_at(table) {
            row.insert("updated_at".into(), stamp.clone());
        }
        row.insert("created_at".into(), stamp);

        tables.table_mut(table)?.push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
        self.take_failure()?;
        let patch = as_object(patch)?;
        let mut tables = self.tables.write().await;
        let stamp = tables.next_stamp();

        let row = tables
            .table_mut(table)?
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        for (column, value) in patch {
            if column == "id" || column == "created_at" {
                continue;
            }
            row.insert(column, value);
        }
        if has_updated_at(table) {
            row.insert("updated_at".into(), stamp);
        }
        Ok(Value::Object(row.clone()))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut tables = self.tables.write().await;
        tables
            .table_mut(table)?
            .retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        Ok(())
    }
}

// ============================================================
// Session service
// ============================================================

struct Account {
    password: String,
    user: AuthUser,
}

/// Session service backed by a fixed set of accounts
pub struct MemoryAuth {
    accounts: HashMap<String, Account>,
    current: RwLock<Option<AuthSession>>,
    fail_session_check: AtomicBool,
    fail_sign_out: AtomicBool,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            current: RwLock::new(None),
            fail_session_check: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
        };
        self.accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user,
            },
        );
        self
    }

    /// Start with `email` already signed in. The account must exist.
    pub fn with_active_session(mut self, email: &str) -> Self {
        let session = self
            .accounts
            .get(&email.to_lowercase())
            .map(|account| AuthSession {
                access_token: Uuid::new_v4().simple().to_string(),
                user: account.user.clone(),
            });
        *self.current.get_mut() = session;
        self
    }

    pub fn fail_session_check(&self, fail: bool) {
        self.fail_session_check.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        if self.fail_session_check.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("session check failed".to_string()));
        }
        Ok(self.current.read().await.clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .filter(|a| a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let session = AuthSession {
            access_token: Uuid::new_v4().simple().to_string(),
            user: account.user.clone(),
        };
        *self.current.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.write().await.take();
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("sign-out failed".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PROPERTY_NAME_EMBED;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn property(name: &str) -> Value {
        json!({ "name": name, "address": "1 Main St", "status": "vacant", "rent_amount": 1000 })
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let row = store
            .insert(tables::PROPERTIES, property("A"))
            .await
            .unwrap();
        assert!(row["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(row["created_at"].is_string());
        assert!(row.get("updated_at").is_none());
    }

    #[tokio::test]
    async fn test_select_is_newest_first() {
        let store = MemoryStore::new();
        for name in ["first", "second", "third"] {
            store.insert(tables::PROPERTIES, property(name)).await.unwrap();
        }
        let rows = store
            .select(&Select::newest_first(tables::PROPERTIES))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_identity() {
        let store = MemoryStore::new();
        let row = store.insert(tables::PROPERTIES, property("A")).await.unwrap();
        let id = row["id"].as_str().unwrap();

        let updated = store
            .update(
                tables::PROPERTIES,
                id,
                json!({ "status": "occupied", "id": "hijack", "created_at": "1970-01-01T00:00:00Z" }),
            )
            .await
            .unwrap();
        assert_eq!(updated["status"], "occupied");
        assert_eq!(updated["name"], "A");
        assert_eq!(updated["id"], row["id"]);
        assert_eq!(updated["created_at"], row["created_at"]);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at_on_maintenance() {
        let store = MemoryStore::new();
        let row = store
            .insert(
                tables::MAINTENANCE_REQUESTS,
                json!({ "title": "t", "description": "d", "property_id": "p", "priority": "low", "status": "new" }),
            )
            .await
            .unwrap();
        let updated = store
            .update(
                tables::MAINTENANCE_REQUESTS,
                row["id"].as_str().unwrap(),
                json!({ "status": "completed" }),
            )
            .await
            .unwrap();
        assert!(updated["updated_at"].as_str() > row["updated_at"].as_str());
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(tables::TENANTS, "nope", json!({ "name": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_embed_resolves_or_nulls() {
        let store = MemoryStore::new();
        let villa = store.insert(tables::PROPERTIES, property("Villa")).await.unwrap();
        for property_id in [villa["id"].as_str().unwrap(), "gone"] {
            store
                .insert(
                    tables::MAINTENANCE_REQUESTS,
                    json!({ "title": "t", "description": "d", "property_id": property_id, "priority": "low", "status": "new" }),
                )
                .await
                .unwrap();
        }

        let rows = store
            .select(&Select::newest_first(tables::MAINTENANCE_REQUESTS).with_embed(PROPERTY_NAME_EMBED))
            .await
            .unwrap();
        assert_eq!(rows[0]["properties"], Value::Null);
        assert_eq!(rows[1]["properties"], json!({ "name": "Villa" }));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = MemoryStore::new();
        let err = store.select(&Select::newest_first("leases")).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(t) if t == "leases"));
    }

    #[tokio::test]
    async fn test_failure_injection_is_consumed() {
        let store = MemoryStore::new();
        store.fail_next(1);
        assert!(store.delete(tables::PROPERTIES, "x").await.is_err());
        assert!(store.delete(tables::PROPERTIES, "x").await.is_ok());
    }

    #[tokio::test]
    async fn test_auth_sign_in_and_out() {
        let auth = MemoryAuth::new().with_user("Owner@Example.com", "hunter22");
        assert_eq!(auth.get_session().await.unwrap(), None);
        assert!(matches!(
            auth.sign_in_with_password("owner@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));

        let session = auth
            .sign_in_with_password("owner@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.user.email, "owner@example.com");
        assert_eq!(auth.get_session().await.unwrap(), Some(session));

        auth.fail_sign_out(true);
        assert!(auth.sign_out().await.is_err());
        assert_eq!(auth.get_session().await.unwrap(), None);
    }
}
