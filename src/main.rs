use anyhow::{Context, Result};
use property_map::{router, AppState, Config, MongoStore, PropertyStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 Property Map API");
    info!("==========================================");

    let config = Config::from_env()?;
    let store = connect_store(&config).await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("👋 Server stopped");
    Ok(())
}

/// A missing or broken store leaves the API up with data routes failing.
async fn connect_store(config: &Config) -> Option<Arc<dyn PropertyStore>> {
    let Some((url, name)) = config.database() else {
        warn!("⚠️  DATABASE_URL or DATABASE_NAME not set, running without a database");
        return None;
    };

    match MongoStore::connect(url, name).await {
        Ok(store) => {
            info!("✅ Using database {}", name);
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!("⚠️  Failed to initialize database: {}", e);
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
