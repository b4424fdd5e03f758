//! Resource descriptors: static bindings from a route segment to a backing
//! table and its set of transparently encrypted fields.

use crate::error::RegistryError;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Binds a public resource name to a table. Immutable once registered.
#[derive(Clone, Debug)]
pub struct ResourceDescriptor {
    /// Route segment and error-message subject. Unique within a set.
    pub name: String,
    /// Backing table name. Trusted: only statically configured values.
    pub table: String,
    /// Field names encrypted at rest.
    pub encrypted_fields: HashSet<String>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        ResourceDescriptor {
            name: name.into(),
            table: table.into(),
            encrypted_fields: HashSet::new(),
        }
    }

    /// Mark a field as encrypted at rest.
    pub fn encrypt_field(mut self, field: impl Into<String>) -> Self {
        self.encrypted_fields.insert(field.into());
        self
    }
}

/// Validated set of descriptors, built once at startup.
#[derive(Clone, Debug)]
pub struct ResourceSet {
    by_name: HashMap<String, ResourceDescriptor>,
}

/// Accepts exactly the identifiers we are willing to splice into SQL.
pub fn is_valid_identifier(s: &str) -> bool {
    // Unwrap is fine: the pattern is a literal.
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    re.is_match(s)
}

impl ResourceSet {
    /// Validates names and table names and rejects duplicates. Fails fast so a
    /// misconfigured process never binds routes.
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(descriptors.len());
        for d in descriptors {
            if !is_valid_identifier(&d.name) {
                return Err(RegistryError::InvalidIdentifier {
                    kind: "resource",
                    value: d.name,
                });
            }
            if !is_valid_identifier(&d.table) {
                return Err(RegistryError::InvalidIdentifier {
                    kind: "table",
                    value: d.table,
                });
            }
            if by_name.contains_key(&d.name) {
                return Err(RegistryError::DuplicateResource(d.name));
            }
            by_name.insert(d.name.clone(), d);
        }
        Ok(ResourceSet { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.by_name.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.by_name.values()
    }
}
