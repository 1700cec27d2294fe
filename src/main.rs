use clap::{Parser, Subcommand};
use colored::*;
use pkgdocs::docs::{IndexLoader, source_for};
use pkgdocs::{RouteTable, Router};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod browse;
mod config;
mod init;
mod render;
mod syntax;

use browse::browse;
use config::Config;
use init::init_config;
use render::{RenderOptions, render_navigation, render_package_list, render_search};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "pkgdocs")]
#[command(about = "Browse package documentation from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./pkgdocs.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Index URL or file, overriding the configuration
    #[arg(long, global = true)]
    index: Option<String>,

    /// Disable syntax highlighting
    #[arg(long, global = true)]
    plain: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a single page, e.g. /docs/<package>/<type>
    Open {
        /// Path to open
        path: String,
    },
    /// Browse interactively
    Browse {
        /// Page to start on (defaults to /)
        path: Option<String>,
    },
    /// List all packages in the index
    Packages,
    /// Search type names across all packages
    Search {
        /// Part of a type name
        query: String,
    },
    /// Initialize a new pkgdocs.toml configuration file
    Init {
        /// Overwrite existing pkgdocs.toml if present
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(verbose: bool) {
    let default_level = if verbose { "pkgdocs=debug" } else { "pkgdocs=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_router(config: &Config, index: Option<String>) -> Result<Router, String> {
    let location = index.unwrap_or_else(|| config.index_location());
    let source = source_for(&location, Duration::from_secs(config.timeout_secs))
        .map_err(|e| e.to_string())?;
    let table = RouteTable::standard().map_err(|e| e.to_string())?;
    Ok(Router::new(table, Arc::new(IndexLoader::new(source))))
}

async fn run(cli: Cli) -> Result<(), String> {
    let Cli {
        command,
        config,
        index,
        plain,
        ..
    } = cli;

    let session = move || -> Result<(Router, RenderOptions), String> {
        let config = Config::load(config.as_deref());
        let opts = RenderOptions {
            // CLI flag overrides config file
            highlight: config.highlight && !plain,
            theme: config.theme.clone(),
        };
        Ok((build_router(&config, index)?, opts))
    };

    match command {
        Commands::Open { path } => {
            let (router, opts) = session()?;
            let nav = router.navigate(&path).await.map_err(|e| e.to_string())?;
            print!("{}", render_navigation(&nav, &opts));
            Ok(())
        }
        Commands::Browse { path } => {
            let (router, opts) = session()?;
            browse(&router, path.as_deref(), &opts).await
        }
        Commands::Packages => {
            let (router, _) = session()?;
            let index = router.loader().load().await.map_err(|e| e.to_string())?;
            print!("{}", render_package_list(&index));
            Ok(())
        }
        Commands::Search { query } => {
            let (router, _) = session()?;
            let index = router.loader().load().await.map_err(|e| e.to_string())?;
            print!("{}", render_search(&index, &query));
            Ok(())
        }
        Commands::Init { force } => init_config(force),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        eprintln!("\n{} {}", "❌".red(), e.red());
        std::process::exit(1);
    }
}
