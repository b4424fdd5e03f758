//! Safe SQL builder: identifiers from validated descriptors only, values as
//! parameters.

mod builder;
mod params;

pub use builder::{delete, insert, select_by_id, select_list, update, QueryBuf};
pub use params::PgBindValue;
