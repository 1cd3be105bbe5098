use anyhow::Context;
use stakefolio::store::StakingStore;
use stakefolio::{
    api, init_db, Config, InMemoryStore, PoolCatalog, Repository, StakingService, StoreBackend,
    SystemClock,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;

    let store: Arc<dyn StakingStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Sqlite => {
            let path = config
                .database_path
                .as_deref()
                .context("DATABASE_PATH is required for the sqlite backend")?;
            let pool = init_db(path)
                .await
                .with_context(|| format!("failed to initialize database at {}", path))?;
            Arc::new(Repository::new(pool))
        }
    };

    let service = Arc::new(StakingService::new(
        store,
        Arc::new(SystemClock),
        PoolCatalog::default(),
        config.recent_transactions_limit,
    ));

    if let Some(interval) = config.sweep_interval {
        let sweep = service.reward_sweep();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = sweep.run().await {
                    tracing::warn!(error = %e, "scheduled reward sweep failed");
                }
            }
        });
        tracing::info!(interval_secs = interval.as_secs(), "reward sweep scheduled");
    }

    let app = api::create_router(api::AppState::new(service));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
