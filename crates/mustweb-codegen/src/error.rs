use mustweb_schema::SchemaError;
use thiserror::Error;

/// Failures raised while building expressions or compiling event handlers.
///
/// All of them are deterministic input errors; none is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An expression was asked for a host-side truth value.
    #[error("expression `{expr}` has no truth value at compile time; pass it as a visibility or state expression instead")]
    ForbiddenTruthiness { expr: String },

    #[error("unsupported expression: {what}")]
    UnsupportedExpression { what: String },

    #[error("no route is registered for handler `{handler}`")]
    EndpointNotFound { handler: String },

    /// Candidates are `METHOD path` strings, sorted.
    #[error("handler `{handler}` matches several routes: {}", .candidates.join(", "))]
    AmbiguousEndpoint {
        handler: String,
        candidates: Vec<String>,
    },

    #[error("field `{field}` does not exist on response {schema} of handler `{handler}`")]
    UnknownResponseField {
        handler: String,
        schema: String,
        field: String,
    },
}

impl CodegenError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        CodegenError::UnsupportedExpression { what: what.into() }
    }
}
