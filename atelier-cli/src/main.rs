//! Atelier designer dashboard
//!
//! Manage products, orders, returns and videos of a designer account from the
//! command line. Results are printed to stdout as JSON (or CSV for exports),
//! logs go to stderr.

mod commands;
mod logging;

use anyhow::{bail, Context, Result};
use atelier_shared::AtelierConfig;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Designer dashboard for the Atelier marketplace")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short = 'c', long, global = true, env = "ATELIER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.or_else(AtelierConfig::default_path);

    if let Commands::Init = cli.command {
        let path = config_path.context("No configuration directory available, pass --config")?;
        return init_config(&path);
    }

    let config = load_config(config_path.as_deref())?;
    logging::init_logging(&config.logging, cli.log_level.map(LogLevel::as_str))?;
    info!("Using backend {}", config.api.base_url);

    cli.command.execute(&config).await
}

fn load_config(path: Option<&Path>) -> Result<AtelierConfig> {
    match path {
        Some(path) if path.exists() => AtelierConfig::load_or_default(Some(path))
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        _ => AtelierConfig::load_or_default(None).context("Invalid default configuration"),
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "Configuration file '{}' already exists. Remove it first if you want to create a new one.",
            path.display()
        );
    }

    AtelierConfig::default()
        .save(path)
        .with_context(|| format!("Failed to create configuration file {}", path.display()))?;

    println!("Configuration file '{}' created.", path.display());
    println!("Edit api.base_url and storage.* to point at your backend, then run `atelier login`.");
    Ok(())
}
