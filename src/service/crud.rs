//! Generic CRUD execution against PostgreSQL.
//!
//! Each operation issues exactly one statement on a pooled connection;
//! isolation between concurrent requests is entirely the storage engine's.
//! Records cross this boundary in their at-rest representation only.

use crate::crypto::Record;
use crate::error::AppError;
use crate::resource::ResourceDescriptor;
use crate::sql::{self, PgBindValue, QueryBuf};
use serde_json::Value;
use sqlx::PgPool;

/// Outcome of an update or delete: whether any row actually matched the id.
/// The HTTP layer treats an unmatched mutation as a no-op, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationResult {
    pub matched: bool,
}

pub struct CrudService;

impl CrudService {
    /// Fetch every row, in primary-key order. An empty table yields an empty vec.
    pub async fn list(
        pool: &PgPool,
        descriptor: &ResourceDescriptor,
    ) -> Result<Vec<Record>, AppError> {
        let q = sql::select_list(descriptor);
        Self::fetch_many(pool, &q).await
    }

    /// Fetch one row by primary key, or None if no row matches.
    pub async fn read(
        pool: &PgPool,
        descriptor: &ResourceDescriptor,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        let q = sql::select_by_id(descriptor, id);
        Self::fetch_optional(pool, &q).await
    }

    /// Insert one at-rest record; returns the created row including the
    /// database-assigned id.
    pub async fn create(
        pool: &PgPool,
        descriptor: &ResourceDescriptor,
        body: &Record,
    ) -> Result<Record, AppError> {
        let q = sql::insert(descriptor, body)?;
        Self::fetch_optional(pool, &q)
            .await?
            .ok_or(AppError::Storage(sqlx::Error::RowNotFound))
    }

    /// Update the fields present in the body for one row by primary key.
    pub async fn update(
        pool: &PgPool,
        descriptor: &ResourceDescriptor,
        id: i64,
        body: &Record,
    ) -> Result<MutationResult, AppError> {
        let q = sql::update(descriptor, id, body)?;
        Self::execute(pool, &q).await
    }

    /// Delete one row by primary key.
    pub async fn delete(
        pool: &PgPool,
        descriptor: &ResourceDescriptor,
        id: i64,
    ) -> Result<MutationResult, AppError> {
        let q = sql::delete(descriptor, id);
        Self::execute(pool, &q).await
    }

    async fn fetch_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn fetch_optional(pool: &PgPool, q: &QueryBuf) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn execute(pool: &PgPool, q: &QueryBuf) -> Result<MutationResult, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let result = query.execute(pool).await?;
        Ok(MutationResult {
            matched: result.rows_affected() > 0,
        })
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Record::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
