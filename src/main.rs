use std::sync::Arc;

use anyhow::Result;
use playbook_proxy::config::Config;
use playbook_proxy::handlers::AppState;
use playbook_proxy::provider::{GenerationClient, HttpBackend};
use playbook_proxy::server::Server;
use playbook_proxy::store::{MemoryStore, QuotaStore, RedisStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("playbook_proxy={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting playbook proxy");
    tracing::info!(
        "configuration: bind_address={}, provider={}, model={}",
        config.bind_address,
        config.provider.name(),
        config.model
    );

    let store: Arc<dyn QuotaStore> = if config.redis_url.trim().is_empty() {
        tracing::warn!("REDIS_URL is empty, quota counters are in-memory only");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            RedisStore::connect(&config.redis_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to quota store: {}", e))?,
        )
    };

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    let backend = HttpBackend::new(
        http,
        config.provider,
        config.api_key.clone(),
        config.model.clone(),
    );
    let state = Arc::new(AppState::new(store, GenerationClient::new(Arc::new(backend))));

    Server::new(config.bind_address.clone(), state)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
