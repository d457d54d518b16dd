//! Table endpoints under `/rest/v1/:table`

use axum::{
    extract::{Path, Query, State},
    http::{header::ACCEPT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{query::Query as SqlQuery, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::query::{self, EmbedPlan, SelectPlan};
use crate::state::{timestamp, AppState};
use crate::tables::{self, Column, Kind, TableSpec};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

type Params = HashMap<String, String>;

/// What the client asked to get back
struct Negotiated {
    representation: bool,
    single: bool,
}

fn negotiate(headers: &HeaderMap) -> Negotiated {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    Negotiated {
        representation: header("prefer").contains("return=representation"),
        single: header(ACCEPT.as_str()).contains(SINGLE_OBJECT),
    }
}

enum SqlValue {
    Text(Option<String>),
    Integer(Option<i64>),
}

fn to_sql(spec: &TableSpec, column: &Column, value: &Value) -> Result<SqlValue, ApiError> {
    let mismatch = || {
        ApiError::BadRequest(format!(
            "invalid value for {}.{}: {}",
            spec.name, column.name, value
        ))
    };
    match (column.kind, value) {
        (Kind::Text, Value::Null) => Ok(SqlValue::Text(None)),
        (Kind::Text, Value::String(s)) => Ok(SqlValue::Text(Some(s.clone()))),
        (Kind::Integer, Value::Null) => Ok(SqlValue::Integer(None)),
        (Kind::Integer, Value::Number(n)) => n
            .as_i64()
            .map(|i| SqlValue::Integer(Some(i)))
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn bind_all<'q>(
    mut query: SqlQuery<'q, Sqlite, SqliteArguments<'q>>,
    values: Vec<SqlValue>,
) -> SqlQuery<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Integer(v) => query.bind(v),
        };
    }
    query
}

fn table_spec(name: &str) -> Result<&'static TableSpec, ApiError> {
    tables::lookup(name).ok_or_else(|| ApiError::UnknownTable(name.to_string()))
}

fn into_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::BadRequest(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Column a client may write. Server-owned columns are skipped, unknown
/// ones rejected.
fn writable_column(spec: &TableSpec, key: &str) -> Result<Option<&'static Column>, ApiError> {
    let column = spec.column(key).ok_or_else(|| {
        ApiError::BadRequest(format!("column {}.{} does not exist", spec.name, key))
    })?;
    Ok(column.writable.then_some(column))
}

fn all_columns(spec: &TableSpec) -> String {
    spec.columns
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_columns(columns: &[&Column], row: &SqliteRow) -> Result<Map<String, Value>, sqlx::Error> {
    let mut map = Map::new();
    for column in columns {
        let value = match column.kind {
            Kind::Text => row
                .try_get::<Option<String>, _>(column.name)?
                .map(Value::from),
            Kind::Integer => row
                .try_get::<Option<i64>, _>(column.name)?
                .map(Value::from),
        };
        map.insert(column.name.to_string(), value.unwrap_or(Value::Null));
    }
    Ok(map)
}

async fn fetch_embed(db: &SqlitePool, embed: &EmbedPlan, id: &str) -> Result<Value, ApiError> {
    let related = table_spec(embed.relation.table)?;
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        all_columns(related),
        related.name
    );
    let row = sqlx::query(&sql).bind(id).fetch_optional(db).await?;
    Ok(match row {
        Some(row) => Value::Object(read_columns(&embed.columns, &row)?),
        None => Value::Null,
    })
}

async fn render(db: &SqlitePool, plan: &SelectPlan, row: &SqliteRow) -> Result<Value, ApiError> {
    let mut object = read_columns(&plan.columns, row)?;
    for embed in &plan.embeds {
        let key: Option<String> = row.try_get(embed.relation.foreign_key)?;
        let related = match key {
            Some(id) => fetch_embed(db, embed, &id).await?,
            None => Value::Null,
        };
        object.insert(embed.relation.name.to_string(), related);
    }
    Ok(Value::Object(object))
}

async fn fetch_one(
    db: &SqlitePool,
    spec: &'static TableSpec,
    plan: &SelectPlan,
    id: &str,
) -> Result<Option<Value>, ApiError> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", all_columns(spec), spec.name);
    match sqlx::query(&sql).bind(id).fetch_optional(db).await? {
        Some(row) => Ok(Some(render(db, plan, &row).await?)),
        None => Ok(None),
    }
}

/// Reply to a write the way the `Prefer` and `Accept` headers ask for
async fn write_response(
    db: &SqlitePool,
    spec: &'static TableSpec,
    params: &Params,
    headers: &HeaderMap,
    id: Option<&str>,
    bare_status: StatusCode,
) -> Result<Response, ApiError> {
    let negotiated = negotiate(headers);
    if !negotiated.representation {
        return Ok(bare_status.into_response());
    }

    let plan = query::parse_select(spec, params.get("select").map(String::as_str))?;
    let row = match id {
        Some(id) => fetch_one(db, spec, &plan, id).await?,
        None => None,
    };
    let status = if bare_status == StatusCode::CREATED {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    match (row, negotiated.single) {
        (Some(row), true) => Ok((status, Json(row)).into_response()),
        (None, true) => Err(ApiError::NoRows),
        (row, false) => Ok((status, Json(row.into_iter().collect::<Vec<_>>())).into_response()),
    }
}

pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let spec = table_spec(&table)?;
    let plan = query::parse_select(spec, params.get("select").map(String::as_str))?;
    let order = query::parse_order(spec, params.get("order").map(String::as_str))?;
    let filter = if params.contains_key("id") {
        Some(query::id_filter(&params)?)
    } else {
        None
    };

    let mut sql = format!("SELECT {} FROM {}", all_columns(spec), spec.name);
    if filter.is_some() {
        sql.push_str(" WHERE id = ?");
    }
    match order {
        Some(order) => {
            let direction = if order.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(
                " ORDER BY {} {}, rowid {}",
                order.column, direction, direction
            ));
        }
        None => sql.push_str(" ORDER BY rowid"),
    }

    let mut statement = sqlx::query(&sql);
    if let Some(id) = &filter {
        statement = statement.bind(id);
    }
    let rows = statement.fetch_all(&state.db).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(render(&state.db, &plan, row).await?);
    }
    Ok(Json(out))
}

pub async fn insert_row(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let spec = table_spec(&table)?;
    let object = into_object(body)?;

    let id = Uuid::new_v4().to_string();
    let now = timestamp();
    let mut names = vec!["id", "created_at"];
    let mut values = vec![SqlValue::Text(Some(id.clone())), SqlValue::Text(Some(now.clone()))];
    if spec.has_updated_at {
        names.push("updated_at");
        values.push(SqlValue::Text(Some(now)));
    }
    for (key, value) in &object {
        if let Some(column) = writable_column(spec, key)? {
            names.push(column.name);
            values.push(to_sql(spec, column, value)?);
        }
    }

    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        spec.name,
        names.join(", "),
        placeholders
    );
    bind_all(sqlx::query(&sql), values)
        .execute(&state.db)
        .await?;
    tracing::info!(table = spec.name, id = %id, "row inserted");

    write_response(
        &state.db,
        spec,
        &params,
        &headers,
        Some(id.as_str()),
        StatusCode::CREATED,
    )
    .await
}

pub async fn update_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let spec = table_spec(&table)?;
    let id = query::id_filter(&params)?;
    let object = into_object(body)?;

    let mut assignments = Vec::new();
    let mut values = Vec::new();
    for (key, value) in &object {
        if let Some(column) = writable_column(spec, key)? {
            assignments.push(format!("{} = ?", column.name));
            values.push(to_sql(spec, column, value)?);
        }
    }
    if spec.has_updated_at {
        assignments.push("updated_at = ?".to_string());
        values.push(SqlValue::Text(Some(timestamp())));
    }

    let matched = if assignments.is_empty() {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", spec.name);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(&id)
            .fetch_one(&state.db)
            .await?;
        count > 0
    } else {
        values.push(SqlValue::Text(Some(id.clone())));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            spec.name,
            assignments.join(", ")
        );
        let result = bind_all(sqlx::query(&sql), values)
            .execute(&state.db)
            .await?;
        result.rows_affected() > 0
    };

    if matched {
        tracing::info!(table = spec.name, id = %id, "row updated");
    }
    let target = matched.then_some(id.as_str());
    write_response(
        &state.db,
        spec,
        &params,
        &headers,
        target,
        StatusCode::NO_CONTENT,
    )
    .await
}

pub async fn delete_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
) -> Result<StatusCode, ApiError> {
    let spec = table_spec(&table)?;
    let id = query::id_filter(&params)?;

    let sql = format!("DELETE FROM {} WHERE id = ?", spec.name);
    let result = sqlx::query(&sql).bind(&id).execute(&state.db).await?;
    tracing::info!(
        table = spec.name,
        id = %id,
        deleted = result.rows_affected(),
        "delete"
    );
    Ok(StatusCode::NO_CONTENT)
}
