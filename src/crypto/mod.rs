//! Field-level encryption: the cipher primitive and the record codec that
//! applies it per resource descriptor.

mod cipher;
mod codec;

pub use cipher::{CipherError, FieldCipher, KEY_LEN};
pub use codec::{Record, RecordCodec};
