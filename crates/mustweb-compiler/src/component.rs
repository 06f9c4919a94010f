//! Element catalogue: tag names, preset classes and bindable attributes.

use crate::config::Preset;

/// Attributes that render as bound directives when given an expression.
pub const BINDABLE_ATTRS: &[&str] = &[
    "disabled",
    "checked",
    "readonly",
    "required",
    "hidden",
    "selected",
    "open",
    "value",
    "placeholder",
    "href",
    "src",
    "title",
    "alt",
    "min",
    "max",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Div,
    Span,
    Paragraph,
    /// `h1` to `h6`; the level is checked by the builder.
    Heading(u8),
    Label,
    Link,
    Form,
    /// Reactive text, rendered as a `span` with a text directive.
    Text,
    Input,
    Button,
}

impl Component {
    pub fn tag(self) -> &'static str {
        match self {
            Component::Div => "div",
            Component::Span | Component::Text => "span",
            Component::Paragraph => "p",
            Component::Heading(1) => "h1",
            Component::Heading(2) => "h2",
            Component::Heading(3) => "h3",
            Component::Heading(4) => "h4",
            Component::Heading(5) => "h5",
            Component::Heading(_) => "h6",
            Component::Label => "label",
            Component::Link => "a",
            Component::Form => "form",
            Component::Input => "input",
            Component::Button => "button",
        }
    }

    /// Void elements render as `<tag ... />` with no children.
    pub fn is_void(self) -> bool {
        matches!(self, Component::Input)
    }

    pub fn default_class(self, preset: Preset) -> Option<&'static str> {
        if preset == Preset::Unstyled {
            return None;
        }
        match self {
            Component::Div | Component::Span | Component::Text => None,
            Component::Paragraph => Some("text-base leading-relaxed text-gray-700"),
            Component::Heading(1) => Some("text-3xl font-bold tracking-tight"),
            Component::Heading(2) => Some("text-2xl font-semibold"),
            Component::Heading(3) => Some("text-xl font-semibold"),
            Component::Heading(_) => Some("text-lg font-medium"),
            Component::Label => Some("block text-sm font-medium text-gray-700"),
            Component::Link => Some("text-blue-600 hover:underline"),
            Component::Form => Some("space-y-4"),
            Component::Input => Some("rounded border border-gray-300 px-3 py-2"),
            Component::Button => {
                Some("rounded bg-blue-600 px-4 py-2 text-white hover:bg-blue-700 disabled:opacity-50")
            }
        }
    }

    /// Attributes this component binds in addition to [`BINDABLE_ATTRS`].
    pub fn extra_bindable(self) -> &'static [&'static str] {
        match self {
            Component::Link => &["target", "rel"],
            Component::Form => &["action"],
            Component::Input => &["type", "name", "step"],
            _ => &[],
        }
    }

    pub fn is_bindable(self, attr: &str) -> bool {
        BINDABLE_ATTRS.contains(&attr) || self.extra_bindable().contains(&attr)
    }
}

/// Default class tokens followed by the user's, in that order.
///
/// User tokens already present in the defaults are dropped; the relative
/// order of what remains never changes.
pub fn merge_classes(default: Option<&str>, user: Option<&str>) -> Option<String> {
    let defaults: Vec<&str> = default.map(|d| d.split_whitespace().collect()).unwrap_or_default();
    let mut tokens = defaults.clone();
    if let Some(user) = user {
        tokens.extend(user.split_whitespace().filter(|t| !defaults.contains(t)));
    }
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Baseline classes of the document shell's `body` and `main` wrapper.
pub fn shell_classes(preset: Preset) -> (Option<&'static str>, Option<&'static str>) {
    match preset {
        Preset::Tailwind => (
            Some("min-h-screen bg-gray-50 text-gray-900"),
            Some("mx-auto max-w-3xl space-y-6 p-6"),
        ),
        Preset::Unstyled => (None, None),
    }
}
