use anyhow::Result;
use mustweb_context::project::MustWebProject;

use crate::demo;
use crate::RenderFlags;

pub async fn run(flags: &RenderFlags, port: Option<u16>) -> Result<()> {
    let project = MustWebProject::load_cwd()?;
    let mut config = project.config.render.clone();
    flags.apply(&mut config);
    let port = port.unwrap_or(project.config.server.port);

    let app = demo::app(config)?;
    eprintln!("  Project: {}", project.config.name);
    mustweb_server::serve(app.into_router(), port).await
}
