use std::sync::Arc;

use recommendations_api::{
    config::{Config, StoreBackend},
    create_router,
    db::{self, MemoryRecommendationStore, PgRecommendationStore, RecommendationStore},
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn RecommendationStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool =
                db::create_pool(&config.database_url, config.database_max_connections).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgRecommendationStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryRecommendationStore::new())
        }
    };

    let app = create_router(AppState::new(store, &config));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, backend = ?config.store_backend, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
