//! Main entry point for the sentinel-tile-downloader CLI

use anyhow::Context;
use clap::Parser;
use sentinel_tile_downloader::catalog::http::HttpCatalogClient;
use sentinel_tile_downloader::shutdown::ShutdownCoordinator;
use sentinel_tile_downloader::{run_pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sentinel-2 tile acquisition and band extraction pipeline
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "params.toml")]
    config: PathBuf,

    /// Validate the configuration file and display the run parameters
    #[arg(short, long)]
    validate: bool,

    /// Display the version/revision and exit
    #[arg(short, long)]
    revision: bool,
}

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentinel_tile_downloader=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Summarize the run configuration, credentials excluded.
fn print_run_configuration(config: &PipelineConfig) {
    println!("Run configuration:");
    println!("  Platform          {}", config.catalog.platform);
    println!("  Product type      {}", config.catalog.product_type);
    println!("  Portal            {}", config.catalog.portal_url);
    println!("  Tiles             {}", config.catalog.tiles.join(", "));
    println!(
        "  Date range        {} .. {}",
        config.catalog.start_date, config.catalog.end_date
    );
    println!("  Bands             {}", config.extraction.bands.join(", "));
    println!("  Preview band      {}", config.extraction.preview_band);
    println!("  Workflow          {}", config.extraction.workflow);
    println!(
        "  Downloads dir     {}",
        config.extraction.downloads_dir.display()
    );
    println!("  Tiles dir         {}", config.extraction.tiles_dir.display());
    println!(
        "  Previews dir      {}",
        config.extraction.previews_dir.display()
    );
    println!("  Queue capacity    {}", config.pipeline.queue_capacity);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.revision {
        println!(
            "{} version {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        return Ok(());
    }

    let config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("failed to load config file {}", cli.config.display()))?;
    config.validate().context("invalid configuration")?;

    if cli.validate {
        print_run_configuration(&config);
        return Ok(());
    }

    let client = HttpCatalogClient::new(&config.catalog.portal_url)?;

    // Ctrl+C stops new downloads; already-queued products are still drained.
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing queued extractions...");
                shutdown.request_shutdown();
            }
        }
    });

    let summary = run_pipeline(&config, client, shutdown)
        .await
        .context("pipeline failed")?;
    info!(
        attempted = summary.products_attempted,
        extracted = summary.products_extracted,
        "pipeline finished"
    );
    Ok(())
}
