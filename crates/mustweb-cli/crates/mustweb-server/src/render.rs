use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use mustweb_codegen::{RouteTable, StateProxy};
use mustweb_compiler::{compile_page, escape_html, CompileError, PageBuilder, RenderConfig};
use mustweb_schema::Schema;

/// A page-definition routine, shared by every request for its page.
pub type PageFn = Arc<dyn Fn(&mut PageBuilder, &StateProxy) -> Result<(), CompileError> + Send + Sync>;

/// Everything one page needs at request time. The route table is the
/// frozen snapshot shared by all pages of the app.
#[derive(Clone)]
pub(crate) struct PageEntry {
    pub path: String,
    pub schema: Schema,
    pub define: PageFn,
    pub routes: Arc<RouteTable>,
    pub config: Arc<RenderConfig>,
}

impl PageEntry {
    /// Build a fresh tree and render it. Each call owns its own builder.
    pub fn render(&self) -> Result<String, CompileError> {
        let define = &self.define;
        compile_page(&self.schema, &self.routes, &self.config, |ml, state| define(ml, state))
    }

    pub fn respond(&self) -> Response {
        match self.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "page compilation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(error_html(&e.to_string()))).into_response()
            }
        }
    }
}

fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body>
        <h1>Page Compilation Error</h1>
        <pre>{}</pre>
        </body></html>"#,
        escape_html(message)
    )
}
