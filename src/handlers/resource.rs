//! Resource CRUD handlers: list, read, create, update, delete.
//!
//! Each handler resolves the descriptor from the route segment, runs the
//! codec on the encrypted side of the boundary, and shapes the response.
//! Records returned to clients are always in-transit; records handed to the
//! service are always at-rest.

use crate::crypto::Record;
use crate::error::AppError;
use crate::response::DeleteConfirmation;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// Identifiers are integers assigned by the database. A malformed id is a
/// client error and short-circuits before any query is issued.
fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::InvalidId(id_str.to_string()))
}

fn body_to_record(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state
        .resources
        .get(&resource)
        .ok_or(AppError::NotFound(resource))?;
    let rows = CrudService::list(&state.pool, descriptor).await?;
    let records = rows
        .iter()
        .map(|r| state.codec.to_in_transit(r, descriptor))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((StatusCode::OK, Json(records)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state
        .resources
        .get(&resource)
        .ok_or_else(|| AppError::NotFound(resource.clone()))?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, descriptor, id)
        .await?
        .ok_or(AppError::NotFound(resource))?;
    let record = state.codec.to_in_transit(&row, descriptor)?;
    Ok((StatusCode::OK, Json(record)))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state
        .resources
        .get(&resource)
        .ok_or(AppError::NotFound(resource))?;
    let body = body_to_record(body)?;
    let at_rest = state.codec.to_at_rest(&body, descriptor)?;
    let row = CrudService::create(&state.pool, descriptor, &at_rest).await?;
    let record = state.codec.to_in_transit(&row, descriptor)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state
        .resources
        .get(&resource)
        .ok_or_else(|| AppError::NotFound(resource.clone()))?;
    let id = parse_id(&id_str)?;
    let body = body_to_record(body)?;
    let at_rest = state.codec.to_at_rest(&body, descriptor)?;
    let result = CrudService::update(&state.pool, descriptor, id, &at_rest).await?;
    if !result.matched {
        // Contractual no-op: a missing row still answers 200.
        tracing::warn!(resource = %resource, id, "update matched no row");
    }
    Ok((StatusCode::OK, Json(body)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let descriptor = state
        .resources
        .get(&resource)
        .ok_or_else(|| AppError::NotFound(resource.clone()))?;
    let id = parse_id(&id_str)?;
    let result = CrudService::delete(&state.pool, descriptor, id).await?;
    if !result.matched {
        tracing::warn!(resource = %resource, id, "delete matched no row");
    }
    Ok((StatusCode::OK, Json(DeleteConfirmation::for_resource(&resource))))
}
