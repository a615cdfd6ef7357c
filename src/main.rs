use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use newsvec::logging;
use newsvec::models::Config;
use newsvec::services::{
    BackoffPolicy, ConnectionSupervisor, DocumentStore, Embedder, HttpEmbeddingClient,
    PostgresDocumentStore, QdrantVectorStore, VectorIndex,
};
use newsvec::worker::VectorizationWorker;

/// Background worker that embeds news articles and flags near-duplicates.
#[derive(Debug, Parser)]
#[command(name = "newsvec", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "NEWSVEC_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;

    logging::init_tracing(&config.logging);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "initializing vectorization worker"
    );

    let documents = Arc::new(PostgresDocumentStore::new(&config.document_store)?);
    let index = Arc::new(QdrantVectorStore::new(
        &config.vector_store,
        u64::from(config.embedding.dimension),
    )?);
    let embedder = Arc::new(HttpEmbeddingClient::new(&config.embedding)?);

    let policy = BackoffPolicy::from(&config.backoff);

    ConnectionSupervisor::new("document-store", policy.clone())
        .connect(|| documents.health_check())
        .await;

    // The collection check is folded into the vector store's connect: the
    // store only counts as connected once the collection exists.
    ConnectionSupervisor::new("vector-store", policy)
        .connect(|| async {
            index.health_check().await?;
            index.ensure_collection().await
        })
        .await;

    // The embedding server is not supervised: an unreachable server surfaces
    // as per-document failures and those documents are retried.
    match embedder.health_check().await {
        Ok(()) => info!(url = embedder.base_url(), "embedding server reachable"),
        Err(e) => warn!(error = %e, "embedding server not reachable yet"),
    }

    let worker = VectorizationWorker::new(
        documents.clone(),
        index,
        embedder,
        config.worker.clone(),
    );

    tokio::select! {
        _ = worker.run() => {}
        _ = shutdown_signal() => {
            info!("received shutdown signal, stopping");
        }
    }

    documents.close().await;
    info!("document store connection closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
