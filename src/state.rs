//! Shared application state for all routes. Fixed for the process lifetime:
//! descriptors and the cipher key never change after startup.

use crate::crypto::RecordCodec;
use crate::resource::ResourceSet;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub resources: Arc<ResourceSet>,
    pub codec: RecordCodec,
}
