use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::handler::Handler;
use axum::routing::{get, on, MethodFilter};
use axum::Router;
use mustweb_codegen::{Method, Route, RouteTable, StateProxy};
use mustweb_compiler::{CompileError, PageBuilder, RenderConfig};
use mustweb_schema::Schema;
use tokio::net::TcpListener;

use crate::render::{PageEntry, PageFn};

struct PageSpec {
    path: String,
    schema: Schema,
    define: PageFn,
}

/// Registers pages and typed remote routes on one axum app.
///
/// Remote routes are mounted as they are registered and recorded in the
/// route table. Pages are mounted by [`MustWeb::into_router`], after the
/// table has been frozen, so every page sees every remote route no matter
/// the registration order.
pub struct MustWeb {
    config: RenderConfig,
    pages: Vec<PageSpec>,
    routes: Vec<Route>,
    router: Router,
}

impl MustWeb {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            routes: Vec::new(),
            router: Router::new(),
        }
    }

    /// Serve a page at `GET path`, built from `schema`'s defaults by `define`.
    pub fn page<F>(mut self, path: &str, schema: &Schema, define: F) -> Result<Self>
    where
        F: Fn(&mut PageBuilder, &StateProxy) -> Result<(), CompileError> + Send + Sync + 'static,
    {
        if self.pages.iter().any(|p| p.path == path) {
            bail!("page `{path}` is registered twice");
        }
        if self
            .routes
            .iter()
            .any(|r| r.path == path && r.method == Method::Get)
        {
            bail!("page `{path}` collides with remote route GET {path}");
        }
        self.pages.push(PageSpec {
            path: path.to_string(),
            schema: schema.clone(),
            define: Arc::new(define),
        });
        Ok(self)
    }

    /// Mount `handler` for `route` and record the route for endpoint
    /// resolution.
    pub fn remote<H, T>(mut self, route: Route, handler: H) -> Result<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        if self
            .routes
            .iter()
            .any(|r| r.path == route.path && r.method == route.method)
        {
            bail!("route {} {} is registered twice", route.method, route.path);
        }
        if route.method == Method::Get && self.pages.iter().any(|p| p.path == route.path) {
            bail!("remote route GET {} collides with a page", route.path);
        }
        self.router = self
            .router
            .route(&route.path, on(method_filter(route.method), handler));
        self.routes.push(route);
        Ok(self)
    }

    /// The route table as pages will see it.
    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(self.routes.clone())
    }

    /// Freeze the route table and mount every page.
    pub fn into_router(self) -> Router {
        let routes = Arc::new(RouteTable::new(self.routes));
        let config = Arc::new(self.config);
        let mut router = self.router;
        for spec in self.pages {
            tracing::debug!(path = %spec.path, schema = spec.schema.name(), "mounting page");
            let entry = PageEntry {
                path: spec.path.clone(),
                schema: spec.schema,
                define: spec.define,
                routes: routes.clone(),
                config: config.clone(),
            };
            router = router.route(
                &spec.path,
                get(move || {
                    let entry = entry.clone();
                    async move { entry.respond() }
                }),
            );
        }
        router
    }
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
        Method::Patch => MethodFilter::PATCH,
        Method::Delete => MethodFilter::DELETE,
    }
}

/// Bind `0.0.0.0:port` and serve `app` until the process stops.
pub async fn serve(app: Router, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    eprintln!("  MustWeb server running at http://localhost:{port}");
    eprintln!();

    serve_on(listener, app).await
}

/// Serve `app` on an already bound listener.
pub async fn serve_on(listener: TcpListener, app: Router) -> Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}
