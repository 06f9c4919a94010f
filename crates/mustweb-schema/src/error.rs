use thiserror::Error;

/// Failures raised while declaring a schema, resolving a field path against
/// it, or turning its defaults into wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A path segment is not declared at that nesting level.
    #[error("field `{path}` does not exist on {root} (unknown segment `{segment}`)")]
    UnknownField {
        root: String,
        path: String,
        segment: String,
    },

    /// A default value cannot be represented in the wire format.
    #[error("field `{path}` holds a {type_name} value, which is not wire-compatible")]
    NonWireValue { path: String, type_name: String },

    /// A mapping in a default value repeats a key.
    #[error("key `{path}` appears more than once in a default value")]
    DuplicateKey { path: String },

    #[error("field `{name}` is declared more than once on {schema}")]
    DuplicateField { schema: String, name: String },

    #[error("`{name}` is not a valid field name on {schema}")]
    InvalidFieldName { schema: String, name: String },
}

impl SchemaError {
    /// The dotted field path this error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            SchemaError::UnknownField { path, .. }
            | SchemaError::NonWireValue { path, .. }
            | SchemaError::DuplicateKey { path } => Some(path),
            SchemaError::DuplicateField { .. } | SchemaError::InvalidFieldName { .. } => None,
        }
    }
}
