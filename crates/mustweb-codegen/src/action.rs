//! Event handler compilation.
//!
//! A handler goes through three phases:
//!
//! 1. **Collecting**: [`ActionBuilder`] appends [`Action`]s in call order.
//! 2. **Analyzing**: [`analyze`] finds guarded regions: a boolean field set
//!    to `true`, then a remote call, then the same field path set back to
//!    `false`.
//! 3. **Emitting**: [`ActionCompiler::compile`] resolves endpoints, checks
//!    result field access and prints one handler body, wrapping each guarded
//!    region in `try { .. } finally { <reset> }`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use mustweb_schema::{is_identifier, Schema, SchemaError};
use serde_json::Value as Json;

use crate::endpoint::{EndpointDescriptor, HandlerRef, Method, RouteTable};
use crate::error::CodegenError;
use crate::expr::{js_string_literal, CallResult, Expr, FieldPath, FieldRef, Literal, Root};

/// Name of the remote-call helper defined by the client runtime script.
pub const CALL_HELPER: &str = "__mustweb_call";

// ── Payloads ────────────────────────────────────────────────────────────────

/// Remote-call argument: a tree of wire literals and expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Literal(Json),
    Expr(Expr),
    Object(Vec<(String, Payload)>),
    List(Vec<Payload>),
}

impl Payload {
    pub fn empty() -> Self {
        Payload::Object(Vec::new())
    }

    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Payload>,
        I: IntoIterator<Item = (K, V)>,
    {
        Payload::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn for_each_expr<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match self {
            Payload::Literal(_) => {}
            Payload::Expr(e) => f(e),
            Payload::Object(entries) => entries.iter().for_each(|(_, v)| v.for_each_expr(f)),
            Payload::List(items) => items.iter().for_each(|v| v.for_each_expr(f)),
        }
    }
}

impl From<Expr> for Payload {
    fn from(e: Expr) -> Self {
        Payload::Expr(e)
    }
}

impl From<&FieldRef> for Payload {
    fn from(f: &FieldRef) -> Self {
        Payload::Expr(f.expr())
    }
}

impl From<FieldRef> for Payload {
    fn from(f: FieldRef) -> Self {
        Payload::Expr(f.expr())
    }
}

impl From<Json> for Payload {
    fn from(v: Json) -> Self {
        Payload::Literal(v)
    }
}

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Literal(Json::Bool(v))
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Literal(Json::from(v))
    }
}

impl From<i32> for Payload {
    fn from(v: i32) -> Self {
        Payload::Literal(Json::from(v))
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Literal(Json::from(v))
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Literal(Json::from(v))
    }
}

impl<T: Into<Payload>> From<Vec<T>> for Payload {
    fn from(v: Vec<T>) -> Self {
        Payload::List(v.into_iter().map(Into::into).collect())
    }
}

// ── Collecting ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Assign {
        target: FieldPath,
        value: Expr,
    },
    Invoke {
        handler: HandlerRef,
        method: Method,
        payload: Payload,
        binding: String,
    },
}

impl Action {
    fn is_invoke(&self) -> bool {
        matches!(self, Action::Invoke { .. })
    }

    /// `Some(flag)` if this assigns a boolean literal to `path`.
    fn assigns_bool(&self, path: &FieldPath) -> Option<bool> {
        match self {
            Action::Assign {
                target,
                value: Expr::Literal(Literal::Bool(b)),
            } if target == path => Some(*b),
            _ => None,
        }
    }
}

/// Ordered, append-only list of actions for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionSequence {
    owner: u64,
    actions: Vec<Action>,
}

impl ActionSequence {
    /// Id of the builder that collected these actions.
    pub fn owner(&self) -> u64 {
        self.owner
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn has_invoke(&self) -> bool {
        self.actions.iter().any(Action::is_invoke)
    }
}

/// Owner ids start at 1; 0 marks a sequence no builder collected.
static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Collects the actions of one event handler.
///
/// Every builder gets a process-unique owner id. Call results carry it, so a
/// result can only be read by the handler that made the call.
#[derive(Debug)]
pub struct ActionBuilder {
    sequence: ActionSequence,
    calls: usize,
}

impl Default for ActionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionBuilder {
    pub fn new() -> Self {
        Self {
            sequence: ActionSequence {
                owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
                actions: Vec::new(),
            },
            calls: 0,
        }
    }

    /// Append `target = value`.
    pub fn assign(&mut self, target: &FieldRef, value: impl Into<Expr>) -> &mut Self {
        self.sequence.actions.push(Action::Assign {
            target: target.path().clone(),
            value: value.into(),
        });
        self
    }

    /// Append a remote call using the default method.
    pub fn invoke(&mut self, handler: &HandlerRef, payload: impl Into<Payload>) -> CallResult {
        self.invoke_with(handler, Method::default(), payload)
    }

    /// Append a remote call declaring `method`.
    pub fn invoke_with(&mut self, handler: &HandlerRef, method: Method, payload: impl Into<Payload>) -> CallResult {
        let binding = format!("__res{}", self.calls);
        self.calls += 1;
        self.sequence.actions.push(Action::Invoke {
            handler: handler.clone(),
            method,
            payload: payload.into(),
            binding: binding.clone(),
        });
        CallResult::new(self.sequence.owner, binding)
    }

    pub fn finish(self) -> ActionSequence {
        self.sequence
    }
}

// ── Analyzing ───────────────────────────────────────────────────────────────

/// Indices into an action sequence describing one guarded region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedRegion {
    /// The `Assign(flag, true)` that opens the pair.
    pub open: usize,
    /// First remote call after `open`; the guarded block starts here.
    pub start: usize,
    /// The `Assign(flag, false)` run as cleanup; the block ends before it.
    pub cleanup: usize,
    pub flag: FieldPath,
}

/// Find guarded regions, left to right, without overlap.
///
/// Pairs are matched by field path. A reset that comes before any remote
/// call closes the pair without guarding anything.
pub fn analyze(actions: &[Action]) -> Vec<GuardedRegion> {
    let mut regions = Vec::new();
    let mut i = 0;
    while i < actions.len() {
        let Action::Assign {
            target,
            value: Expr::Literal(Literal::Bool(true)),
        } = &actions[i]
        else {
            i += 1;
            continue;
        };

        let mut start = None;
        let mut cleanup = None;
        for (j, action) in actions.iter().enumerate().skip(i + 1) {
            if start.is_none() {
                if action.is_invoke() {
                    start = Some(j);
                } else if action.assigns_bool(target) == Some(false) {
                    break;
                }
            } else if action.assigns_bool(target) == Some(false) {
                cleanup = Some(j);
                break;
            }
        }

        match (start, cleanup) {
            (Some(start), Some(cleanup)) => {
                regions.push(GuardedRegion {
                    open: i,
                    start,
                    cleanup,
                    flag: target.clone(),
                });
                i = cleanup + 1;
            }
            _ => i += 1,
        }
    }
    regions
}

// ── Emitting ────────────────────────────────────────────────────────────────

/// A compiled handler body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledHandler {
    pub code: String,
    pub is_async: bool,
    pub guarded_regions: usize,
}

/// Compiles action sequences against one route table snapshot.
///
/// Resolved endpoints are memoized for the lifetime of the compiler, which
/// is one page compilation.
#[derive(Debug)]
pub struct ActionCompiler<'a> {
    routes: &'a RouteTable,
    resolved: HashMap<(String, Method), EndpointDescriptor>,
}

impl<'a> ActionCompiler<'a> {
    pub fn new(routes: &'a RouteTable) -> Self {
        Self {
            routes,
            resolved: HashMap::new(),
        }
    }

    pub fn compile(&mut self, sequence: &ActionSequence) -> Result<CompiledHandler, CodegenError> {
        let actions = sequence.actions();
        let regions = analyze(actions);
        tracing::debug!(
            actions = actions.len(),
            guarded = regions.len(),
            "analyzed event handler"
        );

        let mut scope = BindingScope::new(sequence.owner);
        let mut statements = Vec::new();
        let mut next = 0;
        for region in &regions {
            for action in &actions[next..region.start] {
                statements.push(self.emit(action, &mut scope)?);
            }
            let mut guarded = Vec::new();
            for action in &actions[region.start..region.cleanup] {
                guarded.push(self.emit(action, &mut scope)?);
            }
            let cleanup = self.emit(&actions[region.cleanup], &mut scope)?;
            statements.push(format!(
                "try {{ {} }} finally {{ {} }}",
                guarded.join(" "),
                cleanup
            ));
            next = region.cleanup + 1;
        }
        for action in &actions[next..] {
            statements.push(self.emit(action, &mut scope)?);
        }

        let is_async = sequence.has_invoke();
        let code = if is_async {
            let bindings = scope.order.join(", ");
            format!("async () => {{ let {}; {} }}", bindings, statements.join(" "))
        } else {
            statements.join(" ")
        };
        Ok(CompiledHandler {
            code,
            is_async,
            guarded_regions: regions.len(),
        })
    }

    fn emit(&mut self, action: &Action, scope: &mut BindingScope) -> Result<String, CodegenError> {
        match action {
            Action::Assign { target, value } => {
                if *target.root() != Root::State {
                    return Err(CodegenError::unsupported(format!(
                        "assignment to response field `{target}`"
                    )));
                }
                scope.check_expr(value)?;
                Ok(format!("{} = {};", target.to_js(), value.to_js()))
            }
            Action::Invoke {
                handler,
                method,
                payload,
                binding,
            } => {
                let endpoint = self.resolve(handler, *method)?;
                let mut check = Ok(());
                payload.for_each_expr(&mut |e| {
                    if check.is_ok() {
                        check = scope.check_expr(e);
                    }
                });
                check?;
                if let (Some(schema), Payload::Object(entries)) = (&endpoint.request, payload) {
                    check_request_keys(schema, entries, &mut Vec::new())?;
                }
                let code = format!(
                    "{} = await {}({}, {}, {});",
                    binding,
                    CALL_HELPER,
                    js_string_literal(&endpoint.path),
                    js_string_literal(endpoint.method.as_str()),
                    payload_js(payload)?
                );
                scope.bind(binding, endpoint);
                Ok(code)
            }
        }
    }

    fn resolve(&mut self, handler: &HandlerRef, method: Method) -> Result<EndpointDescriptor, CodegenError> {
        let key = (handler.name().to_string(), method);
        if let Some(endpoint) = self.resolved.get(&key) {
            return Ok(endpoint.clone());
        }
        let endpoint = self.routes.resolve(handler, method)?;
        tracing::debug!(
            handler = handler.name(),
            method = %endpoint.method,
            path = %endpoint.path,
            "resolved endpoint"
        );
        self.resolved.insert(key, endpoint.clone());
        Ok(endpoint)
    }
}

/// Result bindings introduced so far in one handler, in call order.
#[derive(Debug)]
struct BindingScope {
    owner: u64,
    order: Vec<String>,
    endpoints: HashMap<String, EndpointDescriptor>,
}

impl BindingScope {
    fn new(owner: u64) -> Self {
        Self {
            owner,
            order: Vec::new(),
            endpoints: HashMap::new(),
        }
    }

    fn bind(&mut self, binding: &str, endpoint: EndpointDescriptor) {
        self.order.push(binding.to_string());
        self.endpoints.insert(binding.to_string(), endpoint);
    }

    /// Every result field in `expr` must come from an earlier call of this
    /// handler and exist on its response schema.
    fn check_expr(&self, expr: &Expr) -> Result<(), CodegenError> {
        for path in expr.field_paths() {
            if let Root::Result { owner, binding } = path.root() {
                if *owner != self.owner {
                    return Err(CodegenError::unsupported(format!(
                        "response field `{path}` belongs to another event handler"
                    )));
                }
                let Some(endpoint) = self.endpoints.get(binding) else {
                    return Err(CodegenError::unsupported(format!(
                        "response field `{path}` is used before its call"
                    )));
                };
                endpoint.check_response_path(path.segments())?;
            }
        }
        Ok(())
    }
}

fn check_request_keys(schema: &Schema, entries: &[(String, Payload)], prefix: &mut Vec<String>) -> Result<(), CodegenError> {
    for (key, value) in entries {
        prefix.push(key.clone());
        let Some(field) = schema.get(key) else {
            return Err(SchemaError::UnknownField {
                root: schema.name().to_string(),
                path: prefix.join("."),
                segment: key.clone(),
            }
            .into());
        };
        if let (Some(nested), Payload::Object(inner)) = (field.ty.model(), value) {
            check_request_keys(nested, inner, prefix)?;
        }
        prefix.pop();
    }
    Ok(())
}

/// Print a payload as one object expression, depth-first.
fn payload_js(payload: &Payload) -> Result<String, CodegenError> {
    match payload {
        Payload::Literal(value) => wire_js(value),
        Payload::Expr(expr) => Ok(expr.to_js()),
        Payload::Object(entries) => {
            let mut parts = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                parts.push(format!("{}: {}", object_key(key), payload_js(value)?));
            }
            Ok(format!("{{{}}}", parts.join(", ")))
        }
        Payload::List(items) => {
            let parts: Result<Vec<String>, CodegenError> = items.iter().map(payload_js).collect();
            Ok(format!("[{}]", parts?.join(", ")))
        }
    }
}

fn wire_js(value: &Json) -> Result<String, CodegenError> {
    match value {
        Json::Array(items) => {
            let parts: Result<Vec<String>, CodegenError> = items.iter().map(wire_js).collect();
            Ok(format!("[{}]", parts?.join(", ")))
        }
        Json::Object(map) => {
            let mut parts = Vec::with_capacity(map.len());
            for (key, item) in map {
                parts.push(format!("{}: {}", object_key(key), wire_js(item)?));
            }
            Ok(format!("{{{}}}", parts.join(", ")))
        }
        scalar => Ok(Literal::from_json(scalar)?.to_js()),
    }
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        js_string_literal(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Route;
    use crate::expr::{ExprOps, StateProxy};
    use mustweb_schema::FieldType;
    use serde_json::json;

    struct Fixture {
        state: StateProxy,
        increment: HandlerRef,
        routes: RouteTable,
    }

    fn fixture() -> Fixture {
        let schema = Schema::builder("PageState")
            .field("name", FieldType::Str, "Guest")
            .field("count", FieldType::Int, 0)
            .field("loading", FieldType::Bool, false)
            .field("saving", FieldType::Bool, false)
            .build()
            .unwrap();
        let request = Schema::builder("IncrementRequest")
            .field("by", FieldType::Int, 1)
            .build()
            .unwrap();
        let response = Schema::builder("IncrementResponse")
            .field("new_count", FieldType::Int, 0)
            .build()
            .unwrap();
        let increment = HandlerRef::new("increment");
        let routes = RouteTable::new(vec![Route::new(Method::Post, "/api/increment", &increment)
            .request(&request)
            .response(&response)]);
        Fixture {
            state: StateProxy::new(&schema),
            increment,
            routes,
        }
    }

    #[test]
    fn test_guarded_region_detection() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, true);
        let res = h.invoke(&f.increment, Payload::empty());
        h.assign(&count, res.field("new_count"));
        h.assign(&loading, false);
        let seq = h.finish();

        let regions = analyze(seq.actions());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].open, 0);
        assert_eq!(regions[0].start, 1);
        assert_eq!(regions[0].cleanup, 3);
        assert_eq!(regions[0].flag.to_js(), "loading");
    }

    #[test]
    fn test_no_region_without_call_between() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, true);
        h.assign(&loading, false);
        h.invoke(&f.increment, Payload::empty());
        h.assign(&count, 1);
        assert!(analyze(h.finish().actions()).is_empty());
    }

    #[test]
    fn test_no_region_for_different_fields() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let saving = f.state.field("saving").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, true);
        h.invoke(&f.increment, Payload::empty());
        h.assign(&saving, false);
        assert!(analyze(h.finish().actions()).is_empty());
    }

    #[test]
    fn test_sequential_regions() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let saving = f.state.field("saving").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, true);
        h.invoke(&f.increment, Payload::empty());
        h.assign(&loading, false);
        h.assign(&saving, true);
        h.invoke(&f.increment, Payload::empty());
        h.assign(&saving, false);
        let regions = analyze(h.finish().actions());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].open, 3);
        assert_eq!(regions[1].cleanup, 5);
    }

    #[test]
    fn test_compile_guarded_handler() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, true);
        let res = h.invoke(&f.increment, Payload::object([("by", Payload::from(1))]));
        h.assign(&count, res.field("new_count"));
        h.assign(&loading, false);

        let compiled = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap();
        assert!(compiled.is_async);
        assert_eq!(compiled.guarded_regions, 1);
        assert_eq!(
            compiled.code,
            "async () => { let __res0; loading = true; try { __res0 = await __mustweb_call('/api/increment', 'POST', {by: 1}); count = __res0.new_count; } finally { loading = false; } }"
        );
    }

    #[test]
    fn test_compile_actions_after_cleanup_follow_finally() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let name = f.state.field("name").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, true);
        h.invoke(&f.increment, Payload::empty());
        h.assign(&loading, false);
        h.assign(&name, "done");
        let compiled = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap();
        assert!(compiled.code.ends_with("finally { loading = false; } name = 'done'; }"));
    }

    #[test]
    fn test_compile_flat_sync_handler() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&count, &count + 1);
        let compiled = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap();
        assert!(!compiled.is_async);
        assert_eq!(compiled.guarded_regions, 0);
        assert_eq!(compiled.code, "count = count + 1;");
    }

    #[test]
    fn test_compile_flat_async_handler_without_pair() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        let res = h.invoke(&f.increment, Payload::empty());
        h.assign(&count, res.field("new_count"));
        let compiled = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap();
        assert!(compiled.is_async);
        assert!(!compiled.code.contains("try"));
    }

    #[test]
    fn test_payload_mixes_literals_and_expressions() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let name = f.state.field("name").unwrap();
        let payload = Payload::object([
            ("by", Payload::from(&count)),
            ("meta", Payload::from(json!({"source": "button", "tags": ["a", "it's"]}))),
            ("label", Payload::Expr(Expr::concat([Expr::from("hi "), name.expr()]))),
            ("not-ident", Payload::from(true)),
        ]);
        assert_eq!(
            payload_js(&payload).unwrap(),
            "{by: count, meta: {source: 'button', tags: ['a', 'it\\'s']}, label: 'hi ' + name, 'not-ident': true}"
        );
    }

    #[test]
    fn test_request_schema_rejects_unknown_keys() {
        let f = fixture();
        let mut h = ActionBuilder::new();
        h.invoke(&f.increment, Payload::object([("amount", Payload::from(1))]));
        let err = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::Schema(SchemaError::UnknownField { ref segment, .. }) if segment == "amount"
        ));
    }

    #[test]
    fn test_unknown_response_field_aborts() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        let res = h.invoke(&f.increment, Payload::empty());
        h.assign(&count, res.field("newCount"));
        let err = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap_err();
        assert_eq!(
            err,
            CodegenError::UnknownResponseField {
                handler: "increment".into(),
                schema: "IncrementResponse".into(),
                field: "newCount".into(),
            }
        );
    }

    #[test]
    fn test_unresolved_endpoint_aborts() {
        let f = fixture();
        let mut h = ActionBuilder::new();
        h.invoke(&HandlerRef::new("missing"), Payload::empty());
        let err = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap_err();
        assert_eq!(err, CodegenError::EndpointNotFound { handler: "missing".into() });
    }

    #[test]
    fn test_result_from_other_handler_is_rejected() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let mut first = ActionBuilder::new();
        let res = first.invoke(&f.increment, Payload::empty());

        let mut second = ActionBuilder::new();
        second.assign(&count, res.field("new_count"));
        let err = ActionCompiler::new(&f.routes).compile(&second.finish()).unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedExpression { .. }));
    }

    #[test]
    fn test_result_from_other_handler_with_same_binding_is_rejected() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let other = HandlerRef::new("other");
        let other_response = Schema::builder("OtherResponse")
            .field("total", FieldType::Int, 0)
            .build()
            .unwrap();
        let routes = RouteTable::new(vec![
            Route::new(Method::Post, "/api/increment", &f.increment),
            Route::new(Method::Post, "/api/other", &other).response(&other_response),
        ]);

        let mut first = ActionBuilder::new();
        let leaked = first.invoke(&f.increment, Payload::empty());

        // Both handlers bind their first call to `__res0`.
        let mut second = ActionBuilder::new();
        second.invoke(&other, Payload::empty());
        second.assign(&count, leaked.field("new_count"));
        let err = ActionCompiler::new(&routes).compile(&second.finish()).unwrap_err();
        match err {
            CodegenError::UnsupportedExpression { what } => {
                assert!(what.contains("another event handler"));
            }
            unexpected => panic!("unexpected error: {unexpected}"),
        }
    }

    #[test]
    fn test_builders_get_distinct_owners() {
        let first = ActionBuilder::new();
        let second = ActionBuilder::new();
        assert_ne!(first.finish().owner(), second.finish().owner());
        assert_eq!(ActionSequence::default().owner(), 0);
    }

    #[test]
    fn test_multiple_calls_get_distinct_bindings() {
        let f = fixture();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        let a = h.invoke(&f.increment, Payload::empty());
        let b = h.invoke(&f.increment, Payload::empty());
        h.assign(&count, a.field("new_count") + b.field("new_count"));
        let compiled = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap();
        assert!(compiled.code.starts_with("async () => { let __res0, __res1;"));
        assert!(compiled.code.contains("count = __res0.new_count + __res1.new_count;"));
    }

    #[test]
    fn test_condition_expression_in_assignment() {
        let f = fixture();
        let loading = f.state.field("loading").unwrap();
        let count = f.state.field("count").unwrap();
        let mut h = ActionBuilder::new();
        h.assign(&loading, (&count).ge(10));
        let compiled = ActionCompiler::new(&f.routes).compile(&h.finish()).unwrap();
        assert_eq!(compiled.code, "loading = count >= 10;");
    }
}
