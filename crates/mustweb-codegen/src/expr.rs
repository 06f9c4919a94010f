//! Symbolic client-side values.
//!
//! An [`Expr`] never holds the value it names; it only knows how to print
//! itself as client expression text. Field paths are checked against their
//! schema when they are built, so printing never fails.

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, Not, Sub};

use mustweb_schema::{FieldType, Schema};
use serde_json::Value as Json;

use crate::error::CodegenError;

// ── Field paths ─────────────────────────────────────────────────────────────

/// Where a field path starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Root {
    /// The page state model.
    State,
    /// The parsed result of a remote call made by the event handler
    /// `owner`, by binding name.
    Result { owner: u64, binding: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    root: Root,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn to_js(&self) -> String {
        match &self.root {
            Root::State => self.segments.join("."),
            Root::Result { binding, .. } if self.segments.is_empty() => binding.clone(),
            Root::Result { binding, .. } => format!("{}.{}", binding, self.segments.join(".")),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js())
    }
}

/// Entry point for state field references of one page.
#[derive(Debug, Clone)]
pub struct StateProxy {
    schema: Schema,
}

impl StateProxy {
    pub fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A top-level state field.
    pub fn field(&self, name: &str) -> Result<FieldRef, CodegenError> {
        FieldRef::resolve(&self.schema, vec![name.to_string()])
    }

    /// A dotted state path like `user.email`.
    pub fn path(&self, dotted: &str) -> Result<FieldRef, CodegenError> {
        let segments = dotted.split('.').map(|s| s.trim().to_string()).collect();
        FieldRef::resolve(&self.schema, segments)
    }
}

/// A validated reference to a state field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    schema: Schema,
    path: FieldPath,
    ty: FieldType,
}

impl FieldRef {
    fn resolve(schema: &Schema, segments: Vec<String>) -> Result<Self, CodegenError> {
        let ty = schema.resolve(&segments)?;
        Ok(Self {
            schema: schema.clone(),
            path: FieldPath {
                root: Root::State,
                segments,
            },
            ty,
        })
    }

    /// A nested field of this one.
    pub fn field(&self, name: &str) -> Result<FieldRef, CodegenError> {
        let mut segments = self.path.segments.clone();
        segments.push(name.to_string());
        FieldRef::resolve(&self.schema, segments)
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn expr(&self) -> Expr {
        Expr::Field(self.path.clone())
    }
}

/// Handle to the parsed result of one remote call inside an event handler.
///
/// Field access is recorded here and checked against the endpoint's
/// response schema when the handler is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    owner: u64,
    binding: String,
}

impl CallResult {
    pub(crate) fn new(owner: u64, binding: String) -> Self {
        Self { owner, binding }
    }

    /// Id of the event handler that made the call.
    pub fn owner(&self) -> u64 {
        self.owner
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// The whole parsed response.
    pub fn expr(&self) -> Expr {
        self.at(Vec::new())
    }

    pub fn field(&self, name: &str) -> Expr {
        self.at(vec![name.to_string()])
    }

    pub fn path(&self, dotted: &str) -> Expr {
        self.at(dotted.split('.').map(|s| s.trim().to_string()).collect())
    }

    fn at(&self, segments: Vec<String>) -> Expr {
        Expr::Field(FieldPath {
            root: Root::Result {
                owner: self.owner,
                binding: self.binding.clone(),
            },
            segments,
        })
    }
}

// ── Literals ────────────────────────────────────────────────────────────────

/// A wire-compatible scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    /// A float literal; NaN and infinities are not representable.
    pub fn float(value: f64) -> Result<Self, CodegenError> {
        if value.is_finite() {
            Ok(Literal::Float(value))
        } else {
            Err(CodegenError::unsupported(format!(
                "non-finite number literal `{value}`"
            )))
        }
    }

    /// Convert a JSON scalar. Lists and objects are not expression literals.
    pub fn from_json(value: &Json) -> Result<Self, CodegenError> {
        match value {
            Json::Null => Ok(Literal::Null),
            Json::Bool(b) => Ok(Literal::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Literal::Int(i)),
                None => Literal::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Ok(Literal::Str(s.clone())),
            Json::Array(_) => Err(CodegenError::unsupported("list literal")),
            Json::Object(_) => Err(CodegenError::unsupported("object literal")),
        }
    }

    pub fn to_js(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Bool(true) => "true".to_string(),
            Literal::Bool(false) => "false".to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Str(s) => js_string_literal(s),
        }
    }
}

/// Single-quoted client string literal.
///
/// Escapes backslashes, single quotes, CR/LF and the U+2028/U+2029 line
/// separators.
pub fn js_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

// ── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Parse an operator name. Anything outside the closed set is rejected.
    pub fn from_symbol(symbol: &str) -> Result<Self, CodegenError> {
        Ok(match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "==" | "===" => BinaryOp::Eq,
            "!=" | "!==" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "and" | "&&" => BinaryOp::And,
            "or" | "||" => BinaryOp::Or,
            other => return Err(CodegenError::unsupported(format!("operator `{other}`"))),
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Eq => "===",
            BinaryOp::Ne => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Result<Self, CodegenError> {
        match symbol {
            "not" | "!" => Ok(UnaryOp::Not),
            other => Err(CodegenError::unsupported(format!("unary operator `{other}`"))),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }
}

// ── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(FieldPath),
    Literal(Literal),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Mixed text, concatenated left to right.
    Concat(Vec<Expr>),
}

impl Expr {
    /// A state field by dotted path, validated against `schema`.
    pub fn field(schema: &Schema, path: &str) -> Result<Expr, CodegenError> {
        Ok(StateProxy::new(schema).path(path)?.expr())
    }

    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn float(value: f64) -> Result<Expr, CodegenError> {
        Ok(Expr::Literal(Literal::float(value)?))
    }

    pub fn from_json(value: &Json) -> Result<Expr, CodegenError> {
        Ok(Expr::Literal(Literal::from_json(value)?))
    }

    /// Build a binary expression from an operator name.
    pub fn binary(op: &str, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Result<Expr, CodegenError> {
        Ok(Expr::Binary {
            op: BinaryOp::from_symbol(op)?,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        })
    }

    pub fn unary(op: &str, operand: impl Into<Expr>) -> Result<Expr, CodegenError> {
        Ok(Expr::Unary {
            op: UnaryOp::from_symbol(op)?,
            operand: Box::new(operand.into()),
        })
    }

    /// Concatenate text parts; a single part stays as it is.
    pub fn concat<I, T>(parts: I) -> Expr
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        let mut parts: Vec<Expr> = parts.into_iter().map(Into::into).collect();
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Concat(parts)
        }
    }

    /// Expressions have no host-side truth value. Always fails.
    pub fn coerce_bool(&self) -> Result<bool, CodegenError> {
        Err(CodegenError::ForbiddenTruthiness { expr: self.to_js() })
    }

    fn op(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Client expression text.
    pub fn to_js(&self) -> String {
        match self {
            Expr::Field(path) => path.to_js(),
            Expr::Literal(lit) => lit.to_js(),
            Expr::Binary { op, lhs, rhs } => {
                format!("{} {} {}", lhs.operand_js(), op.symbol(), rhs.operand_js())
            }
            Expr::Unary { op, operand } => format!("{}{}", op.symbol(), operand.operand_js()),
            Expr::Concat(parts) => concat_js(parts),
        }
    }

    /// Text for use as an operand; compound expressions are parenthesized.
    fn operand_js(&self) -> String {
        match self {
            Expr::Binary { .. } => format!("({})", self.to_js()),
            Expr::Concat(parts) if parts.len() > 1 => format!("({})", self.to_js()),
            _ => self.to_js(),
        }
    }

    /// Fails if this expression reads a remote-call result.
    ///
    /// Results only exist inside the event handler that made the call, so
    /// markup bindings may only read state.
    pub fn ensure_state_only(&self) -> Result<(), CodegenError> {
        match self.field_paths().into_iter().find(|p| *p.root() != Root::State) {
            Some(path) => Err(CodegenError::unsupported(format!(
                "response field `{path}` used outside the event handler that made the call"
            ))),
            None => Ok(()),
        }
    }

    /// Every field path mentioned by this expression, in source order.
    pub fn field_paths(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Expr::Field(path) => out.push(path),
            Expr::Literal(_) => {}
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_paths(out);
                rhs.collect_paths(out);
            }
            Expr::Unary { operand, .. } => operand.collect_paths(out),
            Expr::Concat(parts) => parts.iter().for_each(|p| p.collect_paths(out)),
        }
    }
}

fn concat_js(parts: &[Expr]) -> String {
    if parts.is_empty() {
        return "''".to_string();
    }
    let is_text = |e: &Expr| matches!(e, Expr::Literal(Literal::Str(_)));
    let mut pieces: Vec<String> = parts.iter().map(Expr::operand_js).collect();
    // `a + b` would add numerically unless one of the first two parts is text.
    let starts_with_text = parts.iter().take(2).any(is_text);
    if !starts_with_text {
        pieces.insert(0, "''".to_string());
    }
    pieces.join(" + ")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js())
    }
}

impl TryFrom<&Expr> for bool {
    type Error = CodegenError;

    fn try_from(expr: &Expr) -> Result<bool, CodegenError> {
        expr.coerce_bool()
    }
}

impl TryFrom<Expr> for bool {
    type Error = CodegenError;

    fn try_from(expr: Expr) -> Result<bool, CodegenError> {
        expr.coerce_bool()
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Expr::Field(field.path)
    }
}

impl From<&FieldRef> for Expr {
    fn from(field: &FieldRef) -> Self {
        field.expr()
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::Literal(Literal::Bool(v))
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Expr::Literal(Literal::Int(v.into()))
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Literal(Literal::Int(v))
    }
}

impl From<u32> for Expr {
    fn from(v: u32) -> Self {
        Expr::Literal(Literal::Int(v.into()))
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::Literal(Literal::Str(v.to_string()))
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Expr::Literal(Literal::Str(v))
    }
}

impl<T: Into<Expr>> From<Option<T>> for Expr {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_else(Expr::null)
    }
}

/// Comparison and logic operators that have no overloadable host operator.
pub trait ExprOps: Into<Expr> + Sized {
    fn equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Eq, self.into(), rhs.into())
    }

    fn not_equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Ne, self.into(), rhs.into())
    }

    fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Lt, self.into(), rhs.into())
    }

    fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Le, self.into(), rhs.into())
    }

    fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Gt, self.into(), rhs.into())
    }

    fn ge(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Ge, self.into(), rhs.into())
    }

    fn and(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::And, self.into(), rhs.into())
    }

    fn or(self, rhs: impl Into<Expr>) -> Expr {
        Expr::op(BinaryOp::Or, self.into(), rhs.into())
    }

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self.into()),
        }
    }
}

impl ExprOps for Expr {}
impl ExprOps for FieldRef {}
impl ExprOps for &FieldRef {}
impl ExprOps for &Expr {}

macro_rules! impl_host_ops {
    ($($ty:ty),*) => {$(
        impl<R: Into<Expr>> Add<R> for $ty {
            type Output = Expr;
            fn add(self, rhs: R) -> Expr {
                Expr::op(BinaryOp::Add, self.into(), rhs.into())
            }
        }

        impl<R: Into<Expr>> Sub<R> for $ty {
            type Output = Expr;
            fn sub(self, rhs: R) -> Expr {
                Expr::op(BinaryOp::Sub, self.into(), rhs.into())
            }
        }

        impl<R: Into<Expr>> BitAnd<R> for $ty {
            type Output = Expr;
            fn bitand(self, rhs: R) -> Expr {
                Expr::op(BinaryOp::And, self.into(), rhs.into())
            }
        }

        impl<R: Into<Expr>> BitOr<R> for $ty {
            type Output = Expr;
            fn bitor(self, rhs: R) -> Expr {
                Expr::op(BinaryOp::Or, self.into(), rhs.into())
            }
        }

        impl Not for $ty {
            type Output = Expr;
            fn not(self) -> Expr {
                ExprOps::not(self)
            }
        }
    )*};
}

impl_host_ops!(Expr, FieldRef, &FieldRef, &Expr);

#[cfg(test)]
mod tests {
    use super::*;
    use mustweb_schema::{SchemaError, Value};

    fn demo_state() -> StateProxy {
        let user = Schema::builder("User")
            .field("email", FieldType::Str, "user@example.com")
            .build()
            .unwrap();
        let schema = Schema::builder("DemoState")
            .field("name", FieldType::Str, "Ada")
            .field("count", FieldType::Int, 1)
            .field("loading", FieldType::Bool, false)
            .model("user", &user)
            .field("meta", FieldType::Any, Value::Null)
            .build()
            .unwrap();
        StateProxy::new(&schema)
    }

    #[test]
    fn test_paths_resolve() {
        let state = demo_state();
        assert_eq!(state.field("name").unwrap().expr().to_js(), "name");
        assert_eq!(
            state.field("user").unwrap().field("email").unwrap().expr().to_js(),
            "user.email"
        );
        assert_eq!(state.path("user.email").unwrap().expr().to_js(), "user.email");
    }

    #[test]
    fn test_missing_field_errors() {
        let state = demo_state();
        let err = state.field("unknown").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::Schema(SchemaError::UnknownField { ref segment, .. }) if segment == "unknown"
        ));
        let err = state.field("user").unwrap().field("phone").unwrap_err();
        assert!(err.to_string().contains("user.phone"));
    }

    #[test]
    fn test_field_constructor_validates() {
        let state = demo_state();
        assert_eq!(Expr::field(state.schema(), "count").unwrap().to_js(), "count");
        assert!(Expr::field(state.schema(), "counter").is_err());
    }

    #[test]
    fn test_any_field_accepts_nested_access() {
        let state = demo_state();
        assert_eq!(state.path("meta.page.title").unwrap().expr().to_js(), "meta.page.title");
    }

    #[test]
    fn test_truthiness_is_forbidden() {
        let state = demo_state();
        let loading = state.field("loading").unwrap().expr();
        assert!(matches!(
            loading.coerce_bool(),
            Err(CodegenError::ForbiddenTruthiness { .. })
        ));
        assert!(bool::try_from(&loading).is_err());
        assert!(bool::try_from(Expr::from(true)).is_err());
        assert!(bool::try_from(Expr::concat(["a", "b"])).is_err());
    }

    #[test]
    fn test_operator_compilation() {
        let state = demo_state();
        let count = state.field("count").unwrap();
        let loading = state.field("loading").unwrap();
        assert_eq!((&count + 1).to_js(), "count + 1");
        assert_eq!((&count - 1).to_js(), "count - 1");
        assert_eq!((&count).equals(0).to_js(), "count === 0");
        assert_eq!((&count).ge(2).to_js(), "count >= 2");
        assert_eq!((&loading & (&count).ge(1)).to_js(), "loading && (count >= 1)");
        assert_eq!((&loading | (&count).ge(1)).to_js(), "loading || (count >= 1)");
        assert_eq!((!&loading).to_js(), "!loading");
        assert_eq!((!(&loading & &count)).to_js(), "!(loading && count)");
    }

    #[test]
    fn test_literal_normalization() {
        let state = demo_state();
        let loading = state.field("loading").unwrap();
        let name = state.field("name").unwrap();
        assert_eq!((&loading | true).to_js(), "loading || true");
        assert_eq!((&loading & false).to_js(), "loading && false");
        assert_eq!((&name).equals(Expr::null()).to_js(), "name === null");
        assert_eq!((&name).equals(None::<&str>).to_js(), "name === null");
        assert_eq!(Expr::from("it's\n\u{2028}").to_js(), r"'it\'s\n\u2028'");
        assert_eq!(Expr::from(r"a\b").to_js(), r"'a\\b'");
    }

    #[test]
    fn test_unsupported_operators_and_literals() {
        let state = demo_state();
        let count = state.field("count").unwrap();
        let err = Expr::binary("*", &count, 2).unwrap_err();
        assert_eq!(err, CodegenError::unsupported("operator `*`"));
        assert!(Expr::unary("-", &count).is_err());
        assert!(Expr::float(f64::NAN).is_err());
        assert!(Expr::from_json(&serde_json::json!([1, 2])).is_err());
        assert_eq!(Expr::binary("and", &count, true).unwrap().to_js(), "count && true");
        assert_eq!(Expr::float(1.5).unwrap().to_js(), "1.5");
    }

    #[test]
    fn test_concat_left_to_right() {
        let state = demo_state();
        let name = state.field("name").unwrap();
        let text = Expr::concat([Expr::from("Hello, "), name.expr(), Expr::from("!")]);
        assert_eq!(text.to_js(), "'Hello, ' + name + '!'");
    }

    #[test]
    fn test_concat_of_numbers_is_text() {
        let state = demo_state();
        let count = state.field("count").unwrap();
        let text = Expr::concat([count.expr(), count.expr()]);
        assert_eq!(text.to_js(), "'' + count + count");
    }

    #[test]
    fn test_concat_wraps_compound_parts() {
        let state = demo_state();
        let count = state.field("count").unwrap();
        let text = Expr::concat([Expr::from("Next: "), &count + 1]);
        assert_eq!(text.to_js(), "'Next: ' + (count + 1)");
    }

    #[test]
    fn test_call_result_paths() {
        let result = CallResult::new(1, "__res0".into());
        assert_eq!(result.field("new_count").to_js(), "__res0.new_count");
        assert_eq!(result.path("a.b").to_js(), "__res0.a.b");
        assert_eq!(result.expr().to_js(), "__res0");
        let paths = (result.field("x") + 1).field_paths().len();
        assert_eq!(paths, 1);
    }

    #[test]
    fn test_results_are_not_state_only() {
        let state = demo_state();
        let count = state.field("count").unwrap();
        let result = CallResult::new(7, "__res0".into());
        assert!((&count + 1).ensure_state_only().is_ok());
        let err = (&count + result.field("new_count")).ensure_state_only().unwrap_err();
        assert!(err.to_string().contains("__res0.new_count"));
        assert!(matches!(
            result.field("x").field_paths()[0].root(),
            Root::Result { owner: 7, .. }
        ));
    }
}
