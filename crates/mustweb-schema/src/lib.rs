//! Data-model side of MustWeb: schema declarations, default values and the
//! wire-safe initial-state payload.

mod error;
mod schema;
mod value;
pub mod wire;

pub use error::SchemaError;
pub use schema::{is_identifier, Field, FieldType, Schema, SchemaBuilder};
pub use value::{EnumValue, Value};
pub use wire::{decode_embedded, encode_embedded, escape_embedded, serialize_state, to_wire, CoercionMode};
