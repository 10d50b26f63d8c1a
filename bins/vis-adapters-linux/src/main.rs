use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vis_adapters::{new_adapters, DataAdapter};
use vis_core::config::Config;

/// Run the configured VIS adapters and log every change they report.
#[derive(Debug, Parser)]
#[command(name = "vis-adapters", version)]
struct Args {
    /// Service configuration file
    #[arg(short, long, default_value = "visconfig.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,vis_adapters=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Can't load config {}", args.config.display()))?;

    let adapters = new_adapters(&config)
        .await
        .context("Can't create adapters")?;

    if adapters.is_empty() {
        tracing::warn!("No adapters enabled in {}", args.config.display());
    }

    let mut monitors = Vec::with_capacity(adapters.len());
    for adapter in &adapters {
        let paths = adapter.path_list()?;
        adapter.subscribe(&paths)?;

        let initial = adapter.get_data(&paths)?;
        tracing::info!(
            adapter = adapter.name(),
            paths = paths.len(),
            "Initial data: {}",
            serde_json::to_string(&initial)?
        );

        let name = adapter.name().to_string();
        let channel = adapter.subscribe_channel();
        monitors.push(tokio::spawn(async move {
            while let Some(changes) = channel.recv().await {
                match serde_json::to_string(&changes) {
                    Ok(json) => tracing::info!(adapter = %name, "Data changed: {}", json),
                    Err(e) => tracing::error!(adapter = %name, "Can't encode changes: {}", e),
                }
            }
            tracing::debug!(adapter = %name, "Notification channel closed");
        }));
    }

    tracing::info!("Adapters running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, shutting down...");

    for adapter in &adapters {
        adapter.close().await;
    }
    for monitor in monitors {
        if let Err(e) = monitor.await {
            tracing::error!("Monitor task failed: {}", e);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
