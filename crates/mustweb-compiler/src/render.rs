use mustweb_codegen::{ActionCompiler, RouteTable, INIT_HELPER, RUNTIME_JS};
use mustweb_schema::{encode_embedded, serialize_state};

use crate::component::{merge_classes, shell_classes};
use crate::config::{OutputMode, Preset, RenderConfig, TAILWIND_CDN};
use crate::error::CompileError;
use crate::node::{AttrValue, Node, Page};

/// Id of the embedded initial-state element read by the client runtime.
pub const STATE_ELEMENT_ID: &str = "__mustweb_state";

/// Serializes finished pages.
///
/// Rendering reads the page and never changes it, so the same page renders
/// to the same text every time.
pub struct Renderer<'a> {
    config: &'a RenderConfig,
    routes: &'a RouteTable,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a RenderConfig, routes: &'a RouteTable) -> Self {
        Self { config, routes }
    }

    /// Render a page as a document or fragment, per configuration.
    ///
    /// Pipeline:
    /// 1. `serialize_state()` → wire defaults, escaped for embedding
    /// 2. walk the tree, compiling click handlers against the route table
    /// 3. wrap in the page root (`x-data`) and, for documents, the HTML shell
    pub fn render(&self, page: &Page) -> Result<String, CompileError> {
        let state = serialize_state(&page.schema, self.config.coercion)?;
        let payload = encode_embedded(&state);

        let mut actions = ActionCompiler::new(self.routes);
        let mut body = String::new();
        for node in &page.nodes {
            render_node(node, self.config.preset, &mut actions, &mut body)?;
        }

        let root = format!(
            r#"<div x-data="{INIT_HELPER}()"><script type="application/json" id="{STATE_ELEMENT_ID}">{payload}</script><script>{RUNTIME_JS}</script>{body}</div>"#
        );
        tracing::debug!(
            schema = page.schema.name(),
            nodes = page.nodes.iter().map(Node::count).sum::<usize>(),
            mode = ?self.config.mode,
            "rendered page"
        );

        Ok(match self.config.mode {
            OutputMode::Fragment => root,
            OutputMode::Document => self.document(&root),
        })
    }

    fn document(&self, root: &str) -> String {
        let config = self.config;
        let lang = escape_html(&config.lang);
        let title = escape_html(&config.title);
        let runtime_src = escape_html(&config.runtime_src);
        let preset_script = match config.preset {
            Preset::Tailwind => format!("<script src=\"{TAILWIND_CDN}\"></script>\n"),
            Preset::Unstyled => String::new(),
        };

        let content = if config.shell {
            let (body_class, main_class) = shell_classes(config.preset);
            format!(
                "<body{}>\n<main{}>\n{root}\n</main>\n</body>",
                class_attr(body_class),
                class_attr(main_class)
            )
        } else {
            format!("<body>\n{root}\n</body>")
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title}</title>
{preset_script}<script defer src="{runtime_src}"></script>
</head>
{content}
</html>"#
        )
    }
}

fn class_attr(class: Option<&str>) -> String {
    match class {
        Some(class) => format!(" class=\"{}\"", escape_html(class)),
        None => String::new(),
    }
}

fn render_node(
    node: &Node,
    preset: Preset,
    actions: &mut ActionCompiler<'_>,
    out: &mut String,
) -> Result<(), CompileError> {
    let tag = node.component.tag();
    out.push('<');
    out.push_str(tag);
    for (name, value) in resolve_attrs(node, preset, actions)? {
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        out.push_str(&escape_attr(&value));
        out.push('"');
    }

    if node.component.is_void() {
        out.push_str(" />");
        return Ok(());
    }
    out.push('>');
    for child in &node.children {
        render_node(child, preset, actions, out)?;
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Ok(())
}

/// Final attribute list of one element, in emission order: class,
/// visibility, the node's own attributes, then the click handler.
fn resolve_attrs(
    node: &Node,
    preset: Preset,
    actions: &mut ActionCompiler<'_>,
) -> Result<Vec<(String, String)>, CompileError> {
    let mut attrs = Vec::with_capacity(node.attrs.len() + 3);

    let default_class = node.component.default_class(preset);
    if let Some(class) = merge_classes(default_class, node.class.as_deref()) {
        attrs.push(("class".to_string(), class));
    }

    if let Some(cond) = &node.show_if {
        cond.ensure_state_only()?;
        attrs.push(("x-show".to_string(), cond.to_js()));
        // Hidden until the runtime evaluates the condition.
        if !node.has_attr("style") {
            attrs.push(("style".to_string(), "display: none;".to_string()));
        }
    }

    for (name, value) in &node.attrs {
        if let AttrValue::Expr(expr) = value {
            expr.ensure_state_only()?;
        }
        let resolved = match value {
            AttrValue::Text(text) => (name.clone(), text.clone()),
            AttrValue::Expr(expr) if is_directive(name) => (name.clone(), expr.to_js()),
            AttrValue::Expr(expr) if node.component.is_bindable(name) => {
                (format!(":{name}"), expr.to_js())
            }
            AttrValue::Expr(expr) => (name.clone(), expr.to_js()),
        };
        attrs.push(resolved);
    }

    if let Some(sequence) = &node.on_click {
        let handler = actions.compile(sequence)?;
        attrs.push(("@click".to_string(), handler.code));
    }
    Ok(attrs)
}

/// Attribute names already written in directive syntax pass through as-is.
fn is_directive(name: &str) -> bool {
    name.starts_with(':') || name.starts_with('@') || name.starts_with("x-")
}

/// Escape HTML special characters in text content.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
///
/// Quotes and `>` are left alone so expression text such as
/// `count >= 1 && name !== ''` stays readable; only `&`, `"` and `<` are
/// replaced.
pub fn escape_attr(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            _ => result.push(ch),
        }
    }
    result
}
