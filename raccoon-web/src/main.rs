//! Raccoon Blog web host

use anyhow::Context;
use clap::Parser;
use raccoon_core::{init_logging, RaccoonConfig};
use raccoon_web::server::RaccoonServerBuilder;
use std::path::PathBuf;
use tracing::{info, warn};

/// Raccoon Blog web server
#[derive(Parser)]
#[command(name = "raccoon-web")]
#[command(about = "Serve Raccoon Blog backed by a document store")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "raccoon.toml")]
    config: PathBuf,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<RaccoonConfig> {
    let mut config = if args.config.exists() {
        RaccoonConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load {}", args.config.display()))?
    } else {
        RaccoonConfig::default()
    };

    config.apply_env_overrides()?;

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.dev {
        config.server.dev_mode = true;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let config = load_config(&args)?;
    init_logging(&config.logging)?;

    if !args.config.exists() {
        warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }

    let server = RaccoonServerBuilder::from_config(config)
        .build()
        .await
        .context("Failed to start Raccoon Blog")?;

    info!("Starting server...");
    server.start().await?;
    Ok(())
}
