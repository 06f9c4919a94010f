//! Node tree and the builder that grows it.
//!
//! [`PageBuilder`] keeps an explicit stack of open elements. A scoped call
//! such as [`PageBuilder::div`] pushes its element, runs the body closure,
//! and pops the element into its parent when the scope guard drops. The pop
//! happens on every exit path: normal return, `?` early return and panic.

use std::ops::{Deref, DerefMut};

use mustweb_codegen::{ActionBuilder, ActionSequence, Expr, FieldRef};
use mustweb_schema::Schema;

use crate::component::Component;
use crate::error::CompileError;

/// An attribute value: fixed text or a client expression.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Expr(Expr),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<Expr> for AttrValue {
    fn from(v: Expr) -> Self {
        AttrValue::Expr(v)
    }
}

impl From<&FieldRef> for AttrValue {
    fn from(v: &FieldRef) -> Self {
        AttrValue::Expr(v.expr())
    }
}

impl From<FieldRef> for AttrValue {
    fn from(v: FieldRef) -> Self {
        AttrValue::Expr(v.expr())
    }
}

/// Options shared by every element call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Opts {
    pub class: Option<String>,
    pub show_if: Option<Expr>,
    pub disable_if: Option<Expr>,
    pub attrs: Vec<(String, AttrValue)>,
}

impl Opts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn show_if(mut self, cond: impl Into<Expr>) -> Self {
        self.show_if = Some(cond.into());
        self
    }

    pub fn disable_if(mut self, cond: impl Into<Expr>) -> Self {
        self.disable_if = Some(cond.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }
}

/// A bare string is taken as the class list.
impl From<&str> for Opts {
    fn from(class: &str) -> Self {
        Opts::new().class(class)
    }
}

impl From<()> for Opts {
    fn from(_: ()) -> Self {
        Opts::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub component: Component,
    pub class: Option<String>,
    pub show_if: Option<Expr>,
    /// Attributes in construction order.
    pub attrs: Vec<(String, AttrValue)>,
    pub on_click: Option<ActionSequence>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(component: Component, opts: Opts) -> Self {
        let Opts {
            class,
            show_if,
            disable_if,
            mut attrs,
        } = opts;
        if let Some(cond) = disable_if {
            attrs.insert(0, ("disabled".to_string(), AttrValue::Expr(cond)));
        }
        Self {
            component,
            class,
            show_if,
            attrs,
            on_click: None,
            children: Vec::new(),
        }
    }

    fn text(content: Expr, opts: Opts) -> Self {
        let mut node = Node::new(Component::Text, opts);
        node.attrs.insert(0, ("x-text".to_string(), AttrValue::Expr(content)));
        node
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

/// A finished page: the state schema and the top-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub schema: Schema,
    pub nodes: Vec<Node>,
}

/// Builds one page's node tree. Owned by a single compilation.
#[derive(Debug)]
pub struct PageBuilder {
    schema: Schema,
    stack: Vec<Node>,
    roots: Vec<Node>,
}

impl PageBuilder {
    pub fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Number of currently open scopes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn finish(self) -> Page {
        debug_assert!(self.stack.is_empty());
        Page {
            schema: self.schema,
            nodes: self.roots,
        }
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn scoped<F>(&mut self, node: Node, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        let mut scope = Scope::enter(self, node);
        body(&mut *scope)
    }

    // ── Containers ──────────────────────────────────────────────────────────

    pub fn div<F>(&mut self, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        self.scoped(Node::new(Component::Div, checked(opts.into())?), body)
    }

    pub fn span<F>(&mut self, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        self.scoped(Node::new(Component::Span, checked(opts.into())?), body)
    }

    pub fn p<F>(&mut self, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        self.scoped(Node::new(Component::Paragraph, checked(opts.into())?), body)
    }

    pub fn heading<F>(&mut self, level: u8, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        if !(1..=6).contains(&level) {
            return Err(CompileError::InvalidElement(format!(
                "heading level {level} is outside 1..=6"
            )));
        }
        self.scoped(Node::new(Component::Heading(level), checked(opts.into())?), body)
    }

    pub fn label<F>(&mut self, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        self.scoped(Node::new(Component::Label, checked(opts.into())?), body)
    }

    pub fn link<F>(&mut self, href: impl Into<AttrValue>, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        let opts = checked(opts.into())?;
        if opts.attrs.iter().any(|(name, _)| name == "href") {
            return Err(CompileError::InvalidElement(
                "link takes its `href` as an argument, not as an attribute".into(),
            ));
        }
        let mut node = Node::new(Component::Link, opts);
        node.attrs.insert(0, ("href".to_string(), href.into()));
        self.scoped(node, body)
    }

    pub fn form<F>(&mut self, opts: impl Into<Opts>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut PageBuilder) -> Result<(), CompileError>,
    {
        let mut node = Node::new(Component::Form, checked(opts.into())?);
        if !node.has_attr("@submit.prevent") {
            node.attrs.push(("@submit.prevent".to_string(), AttrValue::Text(String::new())));
        }
        self.scoped(node, body)
    }

    // ── Leaves ──────────────────────────────────────────────────────────────

    /// Reactive text. Several parts are concatenated left to right.
    pub fn text<I, T>(&mut self, parts: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        self.text_with(parts, Opts::new())
    }

    pub fn text_with<I, T>(&mut self, parts: I, opts: impl Into<Opts>) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        let parts: Vec<Expr> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(CompileError::InvalidElement(
                "text needs at least one part".into(),
            ));
        }
        self.attach(Node::text(Expr::concat(parts), checked(opts.into())?));
        Ok(())
    }

    /// A text input bound two-way to `model`.
    pub fn input(&mut self, model: &FieldRef, opts: impl Into<Opts>) -> Result<(), CompileError> {
        let mut node = Node::new(Component::Input, checked(opts.into())?);
        node.attrs.insert(0, ("x-model".to_string(), AttrValue::Expr(model.expr())));
        if !node.has_attr("type") {
            node.attrs.insert(0, ("type".to_string(), AttrValue::Text("text".into())));
        }
        self.attach(node);
        Ok(())
    }

    /// A button whose click runs the actions collected by `handler`.
    ///
    /// A handler that records nothing renders no click directive.
    pub fn button<F>(&mut self, label: impl Into<Expr>, opts: impl Into<Opts>, handler: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut ActionBuilder) -> Result<(), CompileError>,
    {
        let mut actions = ActionBuilder::new();
        handler(&mut actions)?;
        let sequence = actions.finish();

        let mut node = Node::new(Component::Button, checked(opts.into())?);
        if !node.has_attr("type") {
            node.attrs.insert(0, ("type".to_string(), AttrValue::Text("button".into())));
        }
        if !sequence.is_empty() {
            node.on_click = Some(sequence);
        }
        node.children.push(Node::text(label.into(), Opts::new()));
        self.attach(node);
        Ok(())
    }
}

/// Attribute names the builder writes itself. Each has its own option or
/// element argument.
const RESERVED_ATTRS: &[&str] = &["class", "x-data", "x-show", "x-text", "x-model", "@click", "x-on:click"];

/// Reject user attributes that would collide with ones the builder or the
/// renderer emit.
fn checked(opts: Opts) -> Result<Opts, CompileError> {
    for (i, (name, _)) in opts.attrs.iter().enumerate() {
        if RESERVED_ATTRS.contains(&name.as_str()) {
            return Err(CompileError::InvalidElement(format!(
                "attribute `{name}` is reserved; use the matching option instead"
            )));
        }
        if name == "disabled" && opts.disable_if.is_some() {
            return Err(CompileError::InvalidElement(
                "attribute `disabled` conflicts with `disable_if`".into(),
            ));
        }
        if opts.attrs[..i].iter().any(|(seen, _)| seen == name) {
            return Err(CompileError::InvalidElement(format!(
                "attribute `{name}` is set twice"
            )));
        }
    }
    Ok(opts)
}

/// Open element scope. Dropping it closes the element.
struct Scope<'a> {
    builder: &'a mut PageBuilder,
}

impl<'a> Scope<'a> {
    fn enter(builder: &'a mut PageBuilder, node: Node) -> Self {
        builder.stack.push(node);
        Scope { builder }
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        // Inner scopes drop first, so the top of the stack is this scope's node.
        if let Some(node) = self.builder.stack.pop() {
            self.builder.attach(node);
        }
    }
}

impl Deref for Scope<'_> {
    type Target = PageBuilder;

    fn deref(&self) -> &PageBuilder {
        self.builder
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut PageBuilder {
        self.builder
    }
}
