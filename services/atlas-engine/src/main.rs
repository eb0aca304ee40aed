use anyhow::Context;
use atlas_engine::{
    handlers, AppConfig, HttpWeightStore, InMemoryWeightStore, MatchSelector, RedisWeightStore,
    ScenarioCatalog, ScenarioMatcher, StaticCatalog, WeightBackend, WeightStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Atlas Engine...");

    let config = AppConfig::from_env()?;

    let catalog = StaticCatalog::from_json_file(&config.catalog_path)
        .await
        .with_context(|| format!("Failed to load catalog from {}", config.catalog_path))?;
    info!("✓ Catalog loaded ({} scenarios)", catalog.len());

    let weights = build_weight_store(&config).await?;
    info!("✓ Weight store ready ({})", weights.name());

    let selector = MatchSelector::new(Default::default(), config.weight_timeout());
    let catalog_loaded_at = catalog.loaded_at();
    let matcher = ScenarioMatcher::new(Arc::new(catalog), weights).with_selector(selector);

    let state = Arc::new(handlers::AppState {
        matcher,
        default_top_k: config.default_top_k,
        catalog_loaded_at,
    });

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("🚀 Atlas Engine listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_weight_store(config: &AppConfig) -> anyhow::Result<Arc<dyn WeightStore>> {
    let store: Arc<dyn WeightStore> = match config.weight_backend {
        WeightBackend::Memory => {
            let seed = match &config.weights_path {
                Some(path) => {
                    let json = tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("Failed to read weights from {}", path))?;
                    serde_json::from_str::<HashMap<String, f64>>(&json)
                        .with_context(|| format!("Invalid weights document {}", path))?
                }
                None => HashMap::new(),
            };
            info!("Seeding in-memory weights for {} scenarios", seed.len());
            Arc::new(InMemoryWeightStore::from_iter(seed))
        }
        WeightBackend::Redis => {
            let url = config.redis_url.as_deref().context("ATLAS_REDIS_URL not set")?;
            Arc::new(RedisWeightStore::new(url).await?)
        }
        WeightBackend::Http => {
            let url = config
                .weight_service_url
                .as_deref()
                .context("ATLAS_WEIGHT_SERVICE_URL not set")?;
            Arc::new(HttpWeightStore::new(url)?)
        }
    };

    Ok(store)
}
