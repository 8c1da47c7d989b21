//! DocSign demo binary
//!
//! Entry point for the JSON-lines signing driver.

use anyhow::Result;
use clap::Parser;
use docsign_core::DocsignConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "docsign-demo")]
#[command(version, about = "Place signature boxes and sign a document over stdin/stdout")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the simulated signing latency in milliseconds
    #[arg(long)]
    signing_latency_ms: Option<u64>,

    /// Override the simulated upload latency in milliseconds
    #[arg(long)]
    upload_latency_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // stdout carries the protocol, so ALL logging goes to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("docsign_demo=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = DocsignConfig::load(args.config.as_deref())?;
    if let Some(ms) = args.signing_latency_ms {
        config.signing.latency_ms = ms;
    }
    if let Some(ms) = args.upload_latency_ms {
        config.upload.latency_ms = ms;
    }

    tracing::info!("Starting DocSign demo v{}", env!("CARGO_PKG_VERSION"));
    if config.auth.username.is_none() {
        tracing::warn!("No credentials configured; every login will be rejected");
    }

    docsign_demo::run_stdio(config).await?;
    Ok(())
}
