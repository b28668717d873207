//! quire CLI - Markdown static site generator.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Render a tree of Markdown documents into a static site")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Site root holding src/, templates/, static/ and build/
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Path to quire.toml config file (defaults to <root>/quire.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site (default)
    Build {
        /// Keep existing output instead of clearing build/ first
        #[arg(long)]
        no_erase: bool,
    },

    /// Scaffold a site root with a starter template and page
    Init {
        /// Overwrite existing starter files
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    let result = match cli.command.unwrap_or(Commands::Build { no_erase: false }) {
        Commands::Build { no_erase } => {
            commands::build::run(&cli.root, cli.config.as_deref(), no_erase).await
        }
        Commands::Init { yes } => commands::init::run(&cli.root, yes).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
