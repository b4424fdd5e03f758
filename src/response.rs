//! Response bodies that are not plain records.

use serde::Serialize;

/// Body of a successful delete. Returned even when no row matched, which is
/// the documented no-op contract.
#[derive(Serialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

impl DeleteConfirmation {
    pub fn for_resource(resource: &str) -> Self {
        DeleteConfirmation {
            message: format!("{} deleted successfully", resource),
        }
    }
}
