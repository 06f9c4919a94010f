use mustweb_compiler::RenderConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;

/// Represents the `mustweb.json` project configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl ProjectConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            render: RenderConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mustweb_compiler::{OutputMode, Preset};

    #[test]
    fn test_minimal_config() {
        let config: ProjectConfig = serde_json::from_str(r#"{"name": "demo"}"#).unwrap();
        assert_eq!(config, ProjectConfig::new("demo"));
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_nested_render_section() {
        let config: ProjectConfig = serde_json::from_str(
            r#"{"name": "demo", "render": {"preset": "none", "shell": false}, "server": {"port": 8080}}"#,
        )
        .unwrap();
        assert_eq!(config.render.preset, Preset::Unstyled);
        assert!(!config.render.shell);
        assert_eq!(config.render.mode, OutputMode::Document);
        assert_eq!(config.server.port, 8080);
    }
}
