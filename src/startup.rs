use crate::shutdown;
use meetings_service::components::google_calendar::build_provider;
use meetings_service::components::redis_service::{RedisActor, RedisActorHandle};
use meetings_service::components::store::{DocumentStore, InMemoryStore};
use meetings_service::config::{Config, StoreBackend};
use meetings_service::error::Error;
use meetings_service::handlers::{router, AppState};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and validate the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Connect the configured document store, falling back to memory when Redis is unreachable
async fn connect_store(config: &Config) -> (Arc<dyn DocumentStore>, Option<RedisActorHandle>) {
    if config.store_backend == StoreBackend::Memory {
        info!("Using in-memory document store");
        return (Arc::new(InMemoryStore::new()), None);
    }

    match RedisActor::connect(&config.redis_url).await {
        Ok((mut actor, handle)) => {
            info!("Connected to Redis successfully");
            tokio::spawn(async move {
                actor.run().await;
            });
            (Arc::new(handle.clone()), Some(handle))
        }
        Err(e) => {
            error!("Failed to connect to Redis: {}", e);
            info!("Using in-memory document store as fallback");
            (Arc::new(InMemoryStore::new()), None)
        }
    }
}

/// Build the handlers and serve them until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    let (store, redis_handle) = connect_store(&config).await;
    info!("Document store backend: {}", store.backend());

    let meet = build_provider(&config, Arc::clone(&store))?;
    let state = AppState::from_config(&config, store, meet)?;
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(Error::from)?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(Error::from)?;

    info!("Server stopped, releasing resources");
    shutdown::release(redis_handle).await;

    Ok(())
}
