use mustweb_schema::CoercionMode;
use serde::{Deserialize, Serialize};

/// Default-styling preset applied to components and the document shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Tailwind,
    /// No default classes anywhere.
    #[serde(rename = "none")]
    Unstyled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// A complete HTML document.
    #[default]
    Document,
    /// Only the page's own subtree, for embedding in a host page.
    Fragment,
}

/// Renderer configuration. Every field has a default, so partial
/// configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub preset: Preset,
    /// Wrap document output in the baseline body/main shell.
    pub shell: bool,
    pub mode: OutputMode,
    pub coercion: CoercionMode,
    pub title: String,
    pub lang: String,
    /// URL of the client reactivity runtime loaded in the document head.
    #[serde(rename = "runtimeSrc")]
    pub runtime_src: String,
}

pub const DEFAULT_RUNTIME_SRC: &str = "https://cdn.jsdelivr.net/npm/alpinejs@3.14.8/dist/cdn.min.js";
pub const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            shell: true,
            mode: OutputMode::default(),
            coercion: CoercionMode::default(),
            title: "MustWeb".into(),
            lang: "en".into(),
            runtime_src: DEFAULT_RUNTIME_SRC.into(),
        }
    }
}

impl RenderConfig {
    pub fn fragment() -> Self {
        Self {
            mode: OutputMode::Fragment,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}
