//! Typed errors and HTTP mapping.

use crate::crypto::CipherError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while registering resource descriptors at startup.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),
    #[error("invalid {kind} identifier: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("decryption failed: {0}")]
    Decryption(#[from] CipherError),
    #[error("database: {0}")]
    Storage(#[from] sqlx::Error),
    /// Startup-only: a migration step failed, the process must not serve.
    #[error("migration '{step}' failed: {source}")]
    Migration {
        step: String,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidId(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Registry(_)
            | AppError::Decryption(_)
            | AppError::Storage(_)
            | AppError::Migration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_maps_to_400() {
        let resp = AppError::InvalidId("abc".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = AppError::NotFound("credentials".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_maps_to_500() {
        let resp = AppError::Storage(sqlx::Error::PoolClosed).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_message_names_resource() {
        let e = AppError::NotFound("switchables".into());
        assert_eq!(e.to_string(), "switchables not found");
    }
}
