//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for one resource.
//!
//! Table names come only from validated descriptors; column names from
//! request bodies are checked against the identifier grammar before they are
//! spliced in. Every value binds through a `$n` placeholder.

use crate::error::AppError;
use crate::crypto::Record;
use crate::resource::{is_valid_identifier, ResourceDescriptor};
use serde_json::Value;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Reject column names that did not come from our own configuration.
fn checked_column(name: &str) -> Result<String, AppError> {
    if !is_valid_identifier(name) {
        return Err(AppError::BadRequest(format!("invalid field name: '{}'", name)));
    }
    Ok(quoted(name))
}

/// SELECT all rows, ordered by primary key for deterministic responses.
pub fn select_list(descriptor: &ResourceDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT * FROM {} ORDER BY {}",
        quoted(&descriptor.table),
        quoted("id")
    );
    q
}

/// SELECT one row by primary key. The id binds as the sole parameter; with
/// `id` as primary key at most one row can match.
pub fn select_by_id(descriptor: &ResourceDescriptor, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::Number(id.into()));
    q.sql = format!(
        "SELECT * FROM {} WHERE {} = ${}",
        quoted(&descriptor.table),
        quoted("id"),
        n
    );
    q
}

/// INSERT one row from an at-rest record, returning the created row so the
/// database-assigned id comes back in the same statement.
pub fn insert(descriptor: &ResourceDescriptor, body: &Record) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(body.len());
    let mut placeholders = Vec::with_capacity(body.len());
    for (name, value) in body {
        cols.push(checked_column(name)?);
        let n = q.push_param(value.clone());
        placeholders.push(format!("${}", n));
    }
    let table = quoted(&descriptor.table);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table,
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    Ok(q)
}

/// UPDATE by primary key: SET only the fields present in the body. The id is
/// never updatable and is skipped if submitted.
pub fn update(descriptor: &ResourceDescriptor, id: i64, body: &Record) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(body.len());
    for (name, value) in body {
        if name == "id" {
            continue;
        }
        let col = checked_column(name)?;
        let n = q.push_param(value.clone());
        sets.push(format!("{} = ${}", col, n));
    }
    if sets.is_empty() {
        return Err(AppError::BadRequest("no fields to update".into()));
    }
    let id_param = q.push_param(Value::Number(id.into()));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quoted(&descriptor.table),
        sets.join(", "),
        quoted("id"),
        id_param
    );
    Ok(q)
}

/// DELETE by primary key.
pub fn delete(descriptor: &ResourceDescriptor, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::Number(id.into()));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${}",
        quoted(&descriptor.table),
        quoted("id"),
        n
    );
    q
}
