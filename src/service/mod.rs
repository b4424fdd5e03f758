//! CrudService: generic CRUD execution using the safe SQL builder.

mod crud;

pub use crud::{CrudService, MutationResult};
