//! Handler → endpoint resolution over an immutable route table snapshot.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use mustweb_schema::{Schema, SchemaError};
use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// HTTP method of a remote route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    /// The method used for typed remote calls unless a call says otherwise.
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a server-side handler.
///
/// Two references are the same handler iff their names are equal. The
/// optional return schema plays the role of a return-type annotation.
#[derive(Debug, Clone)]
pub struct HandlerRef {
    name: Arc<str>,
    returns: Option<Schema>,
}

impl HandlerRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            returns: None,
        }
    }

    /// Annotate the handler's return type with a schema.
    pub fn returns(mut self, schema: &Schema) -> Self {
        self.returns = Some(schema.clone());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_schema(&self) -> Option<&Schema> {
        self.returns.as_ref()
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for HandlerRef {}

impl Hash for HandlerRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// One registered route, as reported by the host router.
#[derive(Debug, Clone)]
pub struct Route {
    pub handler: HandlerRef,
    pub method: Method,
    pub path: String,
    pub request: Option<Schema>,
    pub response: Option<Schema>,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, handler: &HandlerRef) -> Self {
        Self {
            handler: handler.clone(),
            method,
            path: path.into(),
            request: None,
            response: None,
        }
    }

    pub fn request(mut self, schema: &Schema) -> Self {
        self.request = Some(schema.clone());
        self
    }

    pub fn response(mut self, schema: &Schema) -> Self {
        self.response = Some(schema.clone());
        self
    }
}

/// Where a response schema came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Declared on the route.
    Declared(Schema),
    /// Taken from the handler's return annotation.
    Annotated(Schema),
    /// Unknown; field access on the result is not checked.
    Untyped,
}

impl ResponseShape {
    fn infer(route: &Route) -> Self {
        if let Some(schema) = &route.response {
            ResponseShape::Declared(schema.clone())
        } else if let Some(schema) = route.handler.return_schema() {
            ResponseShape::Annotated(schema.clone())
        } else {
            ResponseShape::Untyped
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        match self {
            ResponseShape::Declared(s) | ResponseShape::Annotated(s) => Some(s),
            ResponseShape::Untyped => None,
        }
    }
}

/// A resolved (path, method, schemas) tuple for one handler.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    pub handler: String,
    pub method: Method,
    pub path: String,
    pub request: Option<Schema>,
    pub response: ResponseShape,
}

impl EndpointDescriptor {
    fn from_route(route: &Route) -> Self {
        Self {
            handler: route.handler.name().to_string(),
            method: route.method,
            path: route.path.clone(),
            request: route.request.clone(),
            response: ResponseShape::infer(route),
        }
    }

    /// Check a field path on this endpoint's parsed result.
    pub fn check_response_path(&self, segments: &[String]) -> Result<(), CodegenError> {
        let Some(schema) = self.response.schema() else {
            return Ok(());
        };
        if segments.is_empty() {
            return Ok(());
        }
        match schema.resolve(segments) {
            Ok(_) => Ok(()),
            Err(SchemaError::UnknownField { path, .. }) => Err(CodegenError::UnknownResponseField {
                handler: self.handler.clone(),
                schema: schema.name().to_string(),
                field: path,
            }),
            Err(other) => Err(other.into()),
        }
    }

    fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Read-only snapshot of every registered route.
///
/// Descriptors are computed once when the table is built and indexed by
/// handler name; resolution is a pure lookup afterwards, so one table can be
/// shared by concurrent compilations.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    by_handler: HashMap<String, Vec<EndpointDescriptor>>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        let mut by_handler: HashMap<String, Vec<EndpointDescriptor>> = HashMap::new();
        for route in &routes {
            by_handler
                .entry(route.handler.name().to_string())
                .or_default()
                .push(EndpointDescriptor::from_route(route));
        }
        tracing::debug!(routes = routes.len(), handlers = by_handler.len(), "route table frozen");
        Self { routes, by_handler }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolve `handler` for a call declaring `method`.
    ///
    /// A single route for the handler is returned as-is. With several, only
    /// routes using `method` are kept; anything other than exactly one left
    /// is ambiguous.
    pub fn resolve(&self, handler: &HandlerRef, method: Method) -> Result<EndpointDescriptor, CodegenError> {
        let candidates = self
            .by_handler
            .get(handler.name())
            .map(Vec::as_slice)
            .unwrap_or_default();

        match candidates {
            [] => Err(CodegenError::EndpointNotFound {
                handler: handler.name().to_string(),
            }),
            [only] => Ok(only.clone()),
            many => {
                let narrowed: Vec<&EndpointDescriptor> =
                    many.iter().filter(|d| d.method == method).collect();
                match narrowed.as_slice() {
                    [only] => Ok((*only).clone()),
                    _ => {
                        let mut labels: Vec<String> = many.iter().map(EndpointDescriptor::label).collect();
                        labels.sort();
                        Err(CodegenError::AmbiguousEndpoint {
                            handler: handler.name().to_string(),
                            candidates: labels,
                        })
                    }
                }
            }
        }
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        RouteTable::new(iter.into_iter().collect())
    }
}
