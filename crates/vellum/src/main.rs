//! Vellum CLI - compile a folder of markdown notes into a static website.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Compile a folder of markdown notes into a static website")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to vellum.toml config file
    #[arg(short, long, default_value = "vellum.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter site in the content directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,

        /// Content directory (defaults to config or ".")
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Build the static site
    Build {
        /// Content directory (defaults to config or ".")
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output directory, relative to the content directory
        #[arg(short, long)]
        output: Option<String>,

        /// Documents rendered concurrently per batch
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes, dir } => {
            commands::init::run(&cli.config, dir, yes).await?;
        }
        Commands::Build {
            dir,
            output,
            batch_size,
        } => {
            let overrides = commands::build::Overrides {
                content_dir: dir,
                output,
                batch_size,
            };
            commands::build::run(&cli.config, overrides).await?;
        }
    }

    Ok(())
}
