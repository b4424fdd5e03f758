//! Record codec: converts records between their at-rest and in-transit
//! representations, driven by a resource descriptor.
//!
//! Only fields listed in the descriptor's `encrypted_fields` are touched;
//! everything else passes through unchanged. The codec is the only component
//! allowed to convert between the two representations.

use crate::crypto::{CipherError, FieldCipher};
use crate::resource::ResourceDescriptor;
use serde_json::Value;
use std::sync::Arc;

/// One row, as a mapping from field name to JSON value.
pub type Record = serde_json::Map<String, Value>;

#[derive(Clone)]
pub struct RecordCodec {
    cipher: Arc<FieldCipher>,
}

impl RecordCodec {
    pub fn new(cipher: Arc<FieldCipher>) -> Self {
        RecordCodec { cipher }
    }

    /// Encrypt the configured fields for storage. Returns a new record; the
    /// input is never mutated. Fields configured but absent from the record
    /// are skipped, which matters for partial update payloads.
    pub fn to_at_rest(
        &self,
        record: &Record,
        descriptor: &ResourceDescriptor,
    ) -> Result<Record, CipherError> {
        let mut out = Record::new();
        for (name, value) in record {
            if descriptor.encrypted_fields.contains(name) {
                out.insert(name.clone(), Value::String(self.cipher.encrypt(value)?));
            } else {
                out.insert(name.clone(), value.clone());
            }
        }
        Ok(out)
    }

    /// Decrypt the configured fields for the API. Returns a new record.
    /// A SQL NULL in a nullable encrypted column passes through as null;
    /// any other non-string value fails the request, never the process.
    pub fn to_in_transit(
        &self,
        record: &Record,
        descriptor: &ResourceDescriptor,
    ) -> Result<Record, CipherError> {
        let mut out = Record::new();
        for (name, value) in record {
            if descriptor.encrypted_fields.contains(name) && !value.is_null() {
                let stored = value.as_str().ok_or(CipherError::InvalidFormat)?;
                out.insert(name.clone(), self.cipher.decrypt(stored)?);
            } else {
                out.insert(name.clone(), value.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec() -> RecordCodec {
        RecordCodec::new(Arc::new(FieldCipher::from_passphrase("codec test key")))
    }

    fn record(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn no_op_without_encrypted_fields() {
        let c = codec();
        let d = ResourceDescriptor::new("switchables", "relay_switches");
        let rec = record(json!({"name": "lamp", "enabled": false, "target_id": "1"}));
        assert_eq!(c.to_at_rest(&rec, &d).unwrap(), rec);
        assert_eq!(c.to_in_transit(&rec, &d).unwrap(), rec);
    }

    #[test]
    fn encrypted_field_round_trips() {
        let c = codec();
        let d = ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload");
        let rec = record(json!({"name": "api key", "payload": {"secret": 42}}));

        let at_rest = c.to_at_rest(&rec, &d).unwrap();
        // The stored value is opaque ciphertext, not the structure.
        let stored = at_rest["payload"].as_str().unwrap();
        assert!(stored.starts_with("v1."));
        assert_eq!(at_rest["name"], json!("api key"));

        let back = c.to_in_transit(&at_rest, &d).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn partial_record_skips_missing_fields() {
        let c = codec();
        let d = ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload");
        let rec = record(json!({"name": "renamed only"}));
        let at_rest = c.to_at_rest(&rec, &d).unwrap();
        assert_eq!(at_rest, rec);
    }

    #[test]
    fn input_record_is_not_mutated() {
        let c = codec();
        let d = ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload");
        let rec = record(json!({"payload": "plain"}));
        let before = rec.clone();
        let _ = c.to_at_rest(&rec, &d).unwrap();
        assert_eq!(rec, before);
    }

    #[test]
    fn null_in_encrypted_column_passes_through() {
        let c = codec();
        let d = ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload");
        let rec = record(json!({"name": "legacy row", "payload": null}));
        let back = c.to_in_transit(&rec, &d).unwrap();
        assert_eq!(back["payload"], json!(null));
        assert_eq!(back["name"], json!("legacy row"));
    }

    #[test]
    fn non_string_at_rest_value_is_a_request_error() {
        let c = codec();
        let d = ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload");
        let rec = record(json!({"payload": {"not": "ciphertext"}}));
        assert!(matches!(
            c.to_in_transit(&rec, &d),
            Err(CipherError::InvalidFormat)
        ));
    }

    #[test]
    fn foreign_ciphertext_is_a_request_error() {
        let c = codec();
        let d = ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload");
        let other = RecordCodec::new(Arc::new(FieldCipher::from_passphrase("other key")));
        let at_rest = other
            .to_at_rest(&record(json!({"payload": "s"})), &d)
            .unwrap();
        assert!(c.to_in_transit(&at_rest, &d).is_err());
    }
}
