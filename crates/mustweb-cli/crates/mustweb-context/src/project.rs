use crate::config::ProjectConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mustweb.json";

/// A MustWeb project directory and its configuration.
#[derive(Debug, Clone)]
pub struct MustWebProject {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl MustWebProject {
    /// Load a project from the given directory.
    ///
    /// A missing `mustweb.json` is not an error: the project then uses the
    /// default configuration, named after the directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            tracing::debug!(dir = %dir.display(), "no {CONFIG_FILE}, using defaults");
            ProjectConfig::new(&dir_name(dir))
        };
        Ok(Self {
            root: dir.to_path_buf(),
            config,
        })
    }

    /// Load a project from the current working directory.
    pub fn load_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "mustweb-app".to_string())
}
