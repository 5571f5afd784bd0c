//! Samtich survey bot
//!
//! # Usage
//! ```bash
//! samtich-bot [--config bot.json] [--data-file results.json] [--port 18790] [--verbose]
//! ```
//!
//! The token, admin ids and photo pool usually come from the environment
//! (`SAMTICH_BOT_TOKEN`, `SAMTICH_ADMIN_IDS`, `SAMTICH_PHOTO_IDS`); a `.env`
//! file in the working directory is read first.

use anyhow::Context;
use clap::Parser;
use samtich_gateway::{BotConfig, Gateway};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Samtich - Telegram photo-rating survey bot
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Where finished responses are stored
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Status endpoint host
    #[arg(long)]
    host: Option<String>,

    /// Status endpoint port
    #[arg(short, long)]
    port: Option<u16>,

    /// Do not serve /health and /status
    #[arg(long)]
    no_http: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let dotenv = dotenvy::dotenv();

    // Initialize logging; RUST_LOG wins over the defaults
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with_target(false)
            .init();
    }

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring .env: {}", e),
    }

    let config = load_config(&args)?;
    config.validate().context("invalid configuration")?;

    tracing::info!(
        "Samtich bot v{}: {} photos, {} admins, storing to {}",
        samtich_gateway::VERSION,
        config.photo_ids.len(),
        config.admin_ids.len(),
        config.data_file.display()
    );

    let gateway = Gateway::new(config)?;
    let shutdown = gateway.state().shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, finishing queued events (press again to force)");
            shutdown.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Forced exit");
            std::process::exit(130);
        }
    });

    gateway.start().await?;
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<BotConfig> {
    let mut config = match &args.config {
        Some(path) => BotConfig::from_file(path).with_context(|| format!("reading {}", path))?,
        None => BotConfig::default(),
    }
    .apply_env()?;

    if let Some(path) = &args.data_file {
        config = config.with_data_file(path.clone());
    }
    if args.host.is_some() || args.port.is_some() {
        let host = args.host.clone().unwrap_or_else(|| config.http.host.clone());
        let port = args.port.unwrap_or(config.http.port);
        config = config.with_http(host, port);
    }
    if args.no_http {
        config.http.enabled = false;
    }
    Ok(config)
}
