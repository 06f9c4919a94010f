//! Client expression and event-handler code generation.
//!
//! Page authors build [`Expr`]s from state fields and remote-call results,
//! and describe event handlers as [`Action`] sequences. The generator prints
//! both as expression text for the client's reactive directives.

pub mod action;
pub mod endpoint;
mod error;
pub mod expr;

pub use action::{
    analyze, Action, ActionBuilder, ActionCompiler, ActionSequence, CompiledHandler, GuardedRegion,
    Payload, CALL_HELPER,
};
pub use endpoint::{EndpointDescriptor, HandlerRef, Method, ResponseShape, Route, RouteTable};
pub use error::CodegenError;
pub use expr::{
    js_string_literal, BinaryOp, CallResult, Expr, ExprOps, FieldPath, FieldRef, Literal, Root,
    StateProxy, UnaryOp,
};

/// The embedded client runtime: state bootstrap, remote-call helper and
/// its error classes.
pub const RUNTIME_JS: &str = include_str!("runtime.js");

/// Name of the state bootstrap function used in the root `x-data`.
pub const INIT_HELPER: &str = "__mustweb_init";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defines_helpers() {
        assert!(RUNTIME_JS.contains(CALL_HELPER));
        assert!(RUNTIME_JS.contains(INIT_HELPER));
        assert!(RUNTIME_JS.contains("__mustweb_state"));
        for class in ["MustWebTransportError", "MustWebStatusError", "MustWebParseError"] {
            assert!(RUNTIME_JS.contains(class), "missing {class}");
        }
    }

    #[test]
    fn test_runtime_is_safe_to_inline() {
        assert!(!RUNTIME_JS.contains("</"));
    }
}
