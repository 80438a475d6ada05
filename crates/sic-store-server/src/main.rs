//! SIC Vector Store Server - HTTP backend for SIC similarity search.
//!
//! Starts the index build in the background, then serves status and search
//! requests immediately. Searches return 503 until the index is ready.

use anyhow::Result;
use clap::Parser;
use sic_store_server::{start_server, AppState};
use sic_vector_store::{HashIndexBuilder, IndexConfig, LifecycleCoordinator, StatusRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sic-store-server")]
#[command(about = "HTTP server for the SIC vector store")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory containing the SIC reference files (overrides SIC_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for the persisted vector store (overrides VECTOR_STORE_DIR)
    #[arg(long)]
    db_dir: Option<PathBuf>,

    /// Number of nearest matches returned per search (overrides SIC_MATCHES)
    #[arg(long)]
    matches: Option<usize>,

    /// Ignore persisted vectors and embed from scratch
    #[arg(long)]
    rebuild: bool,
}

impl Args {
    /// Layer command-line overrides on top of the environment configuration.
    fn index_config(&self) -> Result<IndexConfig> {
        let mut config = IndexConfig::from_env()?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.db_dir {
            config.db_dir = dir.clone();
        }
        if let Some(matches) = self.matches {
            config.matches = matches;
        }
        if self.rebuild {
            config.from_empty = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting SIC Vector Store Server");

    let config = args.index_config()?;
    info!("Vector store directory: {}", config.db_dir.display());
    info!("Reference data directory: {}", config.data_dir.display());

    let registry = Arc::new(StatusRegistry::new());
    let coordinator = LifecycleCoordinator::new(Arc::new(HashIndexBuilder::new()), registry);
    coordinator.start(config);

    let addr = start_server(AppState::new(coordinator), &args.host, args.port).await?;
    info!("HTTP server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
