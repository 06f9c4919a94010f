mod cmd;
pub mod demo;

use clap::{Args, Parser, Subcommand};
use mustweb_compiler::{OutputMode, Preset, RenderConfig};
use mustweb_schema::CoercionMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mustweb", version, about = "MustWeb - typed server-rendered reactive pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the demo counter page
    Render {
        #[command(flatten)]
        flags: RenderFlags,
        /// Write the output to this file instead of dist/index.html
        #[arg(long, conflicts_with = "stdout")]
        out: Option<PathBuf>,
        /// Print the output instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Serve the demo counter page and its increment endpoint
    Serve {
        #[command(flatten)]
        flags: RenderFlags,
        /// Port to listen on (defaults to mustweb.json, then 3000)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Command-line overrides for the `render` section of `mustweb.json`.
#[derive(Args, Debug, Default, Clone)]
pub struct RenderFlags {
    /// Render only the page subtree, without the document wrapper
    #[arg(long)]
    pub fragment: bool,
    /// Omit the default body/main shell
    #[arg(long)]
    pub no_shell: bool,
    /// Disable the default styling preset
    #[arg(long)]
    pub no_preset: bool,
    /// Convert dates, uuids, enums and decimals in the initial state
    #[arg(long)]
    pub coerce: bool,
}

impl RenderFlags {
    /// Flags only switch things on; unset flags keep the file's value.
    pub fn apply(&self, config: &mut RenderConfig) {
        if self.fragment {
            config.mode = OutputMode::Fragment;
        }
        if self.no_shell {
            config.shell = false;
        }
        if self.no_preset {
            config.preset = Preset::Unstyled;
        }
        if self.coerce {
            config.coercion = CoercionMode::Coerce;
        }
    }
}

pub async fn run() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render { flags, out, stdout } => cmd::render::run(&flags, out.as_deref(), stdout),
        Commands::Serve { flags, port } => cmd::serve::run(&flags, port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
