use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use price_scraper::apis::SearchApiClient;
use price_scraper::chart::render_top_changes_svg;
use price_scraper::config::Config;
use price_scraper::constants::{DEFAULT_CONFIG_PATH, TOP_CHANGES_LIMIT};
use price_scraper::server::{start_server, AppState};
use price_scraper::storage::{InMemoryStorage, SqliteStorage, Storage};
use price_scraper::types::CatalogApi;
use price_scraper::{logging, observability, tasks, views, Pipeline};

#[derive(Parser)]
#[command(name = "price_scraper")]
#[command(about = "Product catalog price-change scraper")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Keep snapshots in memory instead of the SQLite store
    #[arg(long)]
    in_memory: bool,

    /// Install the Prometheus recorder (served at /metrics)
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one catalog page, run the pipeline and store the snapshot
    Fetch,
    /// Serve the stored snapshot over HTTP
    Serve {
        /// Port to run the server on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch once, then serve
    Run {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Render the top price changes as an SVG file
    Chart {
        #[arg(short, long, default_value = "top_changes.svg")]
        output: PathBuf,
        /// Fetch a fresh snapshot before rendering
        #[arg(long)]
        refresh: bool,
    },
}

fn create_storage(config: &Config, in_memory: bool) -> Result<Arc<dyn Storage>> {
    if in_memory || config.storage.in_memory {
        info!("Using in-memory storage");
        Ok(Arc::new(InMemoryStorage::new()))
    } else {
        let storage = SqliteStorage::open(&config.storage.db_path)
            .with_context(|| format!("opening product store at {}", config.storage.db_path))?;
        Ok(Arc::new(storage))
    }
}

async fn fetch_once(api: &dyn CatalogApi, pipeline: &Pipeline, storage: &dyn Storage) -> Result<()> {
    match tasks::refresh(api, pipeline, storage).await {
        Ok(summary) => {
            println!("\n📊 Pipeline results:");
            println!("   Run id:      {}", summary.run_id);
            println!("   Products:    {}", summary.product_count);
            println!("   Outliers:    {}", summary.outlier_count);
            println!("   Fingerprint: {}", summary.fingerprint);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e).context("refresh failed")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("loading configuration")?;

    if cli.metrics {
        if let Err(e) = observability::init() {
            warn!("Failed to initialize metrics: {}", e);
        }
    }

    let storage = create_storage(&config, cli.in_memory)?;
    let pipeline = Pipeline::with_fence_multiplier(config.pipeline.fence_multiplier);
    let api: Arc<dyn CatalogApi> = Arc::new(SearchApiClient::new(config.upstream.clone())?);

    match cli.command {
        Commands::Fetch => {
            println!("🔄 Fetching catalog...");
            fetch_once(api.as_ref(), &pipeline, storage.as_ref()).await?;
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(storage, pipeline, Some(api));
            start_server(state, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {}", e))?;
        }
        Commands::Run { port } => {
            println!("🚀 Running fetch, then serving...");
            fetch_once(api.as_ref(), &pipeline, storage.as_ref()).await?;
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(storage, pipeline, Some(api));
            start_server(state, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {}", e))?;
        }
        Commands::Chart { output, refresh } => {
            if refresh {
                fetch_once(api.as_ref(), &pipeline, storage.as_ref()).await?;
            }
            let dataset = storage.load_all().await?;
            if dataset.is_empty() {
                warn!("Stored snapshot is empty; chart will have no bars");
            }
            let svg = render_top_changes_svg(&views::top_changes(&dataset, TOP_CHANGES_LIMIT));
            std::fs::write(&output, svg).with_context(|| format!("writing {}", output.display()))?;
            println!("🖼️  Chart written to {}", output.display());
        }
    }
    Ok(())
}
