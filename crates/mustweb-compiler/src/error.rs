use mustweb_codegen::CodegenError;
use mustweb_schema::SchemaError;
use thiserror::Error;

/// Any failure that aborts a page compilation. No partial output is
/// produced once one of these is raised.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A builder call that cannot produce a valid element.
    #[error("invalid element: {0}")]
    InvalidElement(String),
}
