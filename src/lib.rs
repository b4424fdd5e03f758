//! Switchboard: table-backed REST resources with transparent field encryption.
//!
//! A `ResourceDescriptor` binds a route segment to a table and an optional
//! set of encrypted fields; the route table exposes list/get/create/update/
//! delete for every registered descriptor. Encrypted fields are ciphertext in
//! the database and plaintext JSON at the HTTP boundary; the record codec is
//! the only place that converts between the two.

pub mod crypto;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use crypto::{FieldCipher, Record, RecordCodec};
pub use error::{AppError, RegistryError};
pub use migration::{apply_migrations, Migration, BUILTIN_MIGRATIONS};
pub use resource::{ResourceDescriptor, ResourceSet};
pub use routes::{common_routes, resource_routes};
pub use service::{CrudService, MutationResult};
pub use settings::Settings;
pub use state::AppState;
