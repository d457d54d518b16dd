//! PostgREST query-string grammar
//!
//! The subset the client uses: `select=*,rel(col,...)`, `order=col.desc`
//! and `id=eq.<id>` filters.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::tables::{self, Column, Relation, TableSpec};

#[derive(Debug)]
pub struct EmbedPlan {
    pub relation: &'static Relation,
    pub columns: Vec<&'static Column>,
}

#[derive(Debug)]
pub struct SelectPlan {
    pub columns: Vec<&'static Column>,
    pub embeds: Vec<EmbedPlan>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct OrderPlan {
    pub column: &'static str,
    pub descending: bool,
}

/// Split on commas that are not inside parentheses
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(raw[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn resolve_columns(spec: &'static TableSpec, list: &str) -> Result<Vec<&'static Column>, ApiError> {
    let mut columns = Vec::new();
    for item in split_top_level(list) {
        if item == "*" {
            columns.extend(spec.columns.iter());
            continue;
        }
        let column = spec.column(item).ok_or_else(|| {
            ApiError::BadRequest(format!("column {}.{} does not exist", spec.name, item))
        })?;
        columns.push(column);
    }
    Ok(columns)
}

pub fn parse_select(spec: &'static TableSpec, raw: Option<&str>) -> Result<SelectPlan, ApiError> {
    let raw = raw.unwrap_or("*");
    let mut plain = Vec::new();
    let mut embeds = Vec::new();

    for item in split_top_level(raw) {
        match item.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').ok_or_else(|| {
                    ApiError::BadRequest(format!("unbalanced parentheses in {:?}", item))
                })?;
                let relation = spec.relation(name.trim()).ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "no relationship between {} and {}",
                        spec.name,
                        name.trim()
                    ))
                })?;
                let related = tables::lookup(relation.table)
                    .ok_or_else(|| ApiError::UnknownTable(relation.table.to_string()))?;
                embeds.push(EmbedPlan {
                    relation,
                    columns: resolve_columns(related, inner)?,
                });
            }
            None => plain.push(item),
        }
    }

    let columns = if plain.is_empty() && embeds.is_empty() {
        spec.columns.iter().collect()
    } else {
        resolve_columns(spec, &plain.join(","))?
    };
    Ok(SelectPlan { columns, embeds })
}

pub fn parse_order(spec: &TableSpec, raw: Option<&str>) -> Result<Option<OrderPlan>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let (name, direction) = raw.split_once('.').unwrap_or((raw, "asc"));
    let descending = match direction {
        "asc" => false,
        "desc" => true,
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown order direction {:?}",
                other
            )))
        }
    };
    let column = spec.column(name).ok_or_else(|| {
        ApiError::BadRequest(format!("column {}.{} does not exist", spec.name, name))
    })?;
    Ok(Some(OrderPlan {
        column: column.name,
        descending,
    }))
}

/// The id from an `id=eq.<id>` filter. Updates and deletes must name one row.
pub fn id_filter(params: &HashMap<String, String>) -> Result<String, ApiError> {
    let raw = params
        .get("id")
        .ok_or_else(|| ApiError::BadRequest("an id=eq.<id> filter is required".to_string()))?;
    raw.strip_prefix("eq.")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported id filter {:?}", raw)))
}
