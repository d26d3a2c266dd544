use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod repository;
pub mod service;
pub mod store;

use crate::config::{Config, StoreBackend};
use crate::repository::config::CONFIG_COLLECTION;
use crate::repository::history::HISTORY_COLLECTION;
use crate::service::TestTracker;
use crate::store::{DocumentStore, ElasticsearchStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeconf_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting pipeconf server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let store = connect_store(&config.store).await?;

    let tracker = TestTracker::new(Arc::clone(&store), config.tracker_settings());
    let _sweeper = tracker.spawn_sweeper(config.sweep_interval);

    // Build router with all API endpoints
    let app = api::create_router(api::AppState { store, tracker });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}

async fn connect_store(backend: &StoreBackend) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Elasticsearch { url, index_prefix } => {
            tracing::info!("Connecting to Elasticsearch at {}...", url);

            let store = ElasticsearchStore::new(url.as_str(), index_prefix.as_str());
            for collection in [CONFIG_COLLECTION, HISTORY_COLLECTION] {
                store
                    .ensure_collection(collection)
                    .await
                    .with_context(|| format!("Failed to prepare index for {}", collection))?;
            }

            tracing::info!("Elasticsearch indices ready");
            Ok(Arc::new(store))
        }
    }
}
