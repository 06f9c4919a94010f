use anyhow::{Context, Result};
use mustweb_compiler::compile_page;
use mustweb_context::project::MustWebProject;
use std::fs;
use std::path::{Path, PathBuf};

use crate::demo;
use crate::RenderFlags;

/// File written under the project's `dist/` when no `--out` is given.
const DEFAULT_OUTPUT: &str = "index.html";

pub fn run(flags: &RenderFlags, out: Option<&Path>, stdout: bool) -> Result<()> {
    let project = MustWebProject::load_cwd()?;
    if stdout {
        println!("{}", render(&project, flags)?);
        return Ok(());
    }
    let path = write(&project, flags, out)?;
    println!("  counter -> {}", path.display());
    Ok(())
}

/// Compile the counter page with the project's configuration and `flags`.
fn render(project: &MustWebProject, flags: &RenderFlags) -> Result<String> {
    let mut config = project.config.render.clone();
    flags.apply(&mut config);

    let schema = demo::state_schema()?;
    let routes = demo::route_table()?;
    compile_page(&schema, &routes, &config, demo::counter_page)
        .context("Failed to compile the counter page")
}

/// Render and write to `out`, or to `dist/index.html` in the project.
fn write(project: &MustWebProject, flags: &RenderFlags, out: Option<&Path>) -> Result<PathBuf> {
    let html = render(project, flags)?;
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => project.dist_dir().join(DEFAULT_OUTPUT),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, &html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_to_dist_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let project = MustWebProject::load(dir.path()).unwrap();
        let path = write(&project, &RenderFlags::default(), None).unwrap();
        assert_eq!(path, dir.path().join("dist").join(DEFAULT_OUTPUT));
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_out_overrides_dist() {
        let dir = tempfile::tempdir().unwrap();
        let project = MustWebProject::load(dir.path()).unwrap();
        let out = dir.path().join("pages").join("counter.html");
        let flags = RenderFlags {
            fragment: true,
            ..RenderFlags::default()
        };
        let path = write(&project, &flags, Some(&out)).unwrap();
        assert_eq!(path, out);
        assert!(!dir.path().join("dist").exists());
        let html = fs::read_to_string(&out).unwrap();
        assert!(html.starts_with(r#"<div x-data="__mustweb_init()">"#));
    }
}
