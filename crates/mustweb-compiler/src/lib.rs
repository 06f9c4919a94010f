mod component;
mod config;
mod error;
mod node;
pub mod render;

use mustweb_codegen::{RouteTable, StateProxy};
use mustweb_schema::Schema;

pub use component::{merge_classes, Component, BINDABLE_ATTRS};
pub use config::{OutputMode, Preset, RenderConfig, DEFAULT_RUNTIME_SRC, TAILWIND_CDN};
pub use error::CompileError;
pub use node::{AttrValue, Node, Opts, Page, PageBuilder};
pub use render::{escape_html, Renderer};

/// Build a page's node tree by running its definition routine.
///
/// The routine receives a fresh builder and the state proxy for `schema`.
/// Any error it returns aborts the build.
pub fn build_page<F>(schema: &Schema, define: F) -> Result<Page, CompileError>
where
    F: FnOnce(&mut PageBuilder, &StateProxy) -> Result<(), CompileError>,
{
    let state = StateProxy::new(schema);
    let mut builder = PageBuilder::new(schema);
    define(&mut builder, &state)?;
    let page = builder.finish();
    tracing::debug!(schema = schema.name(), roots = page.nodes.len(), "built page");
    Ok(page)
}

/// Compile a page definition into one HTML string.
///
/// This is the main API: builds the node tree, serializes the schema's
/// defaults as the initial state, compiles click handlers against `routes`
/// and renders the result per `config`.
pub fn compile_page<F>(
    schema: &Schema,
    routes: &RouteTable,
    config: &RenderConfig,
    define: F,
) -> Result<String, CompileError>
where
    F: FnOnce(&mut PageBuilder, &StateProxy) -> Result<(), CompileError>,
{
    let page = build_page(schema, define)?;
    Renderer::new(config, routes).render(&page)
}
