pub mod diagnostics;
pub mod error;
pub mod handlers;

use crate::config::Config;
use crate::store::{IndexOutcome, PropertyStore, StoreError};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// `None` when the store is not configured or failed to initialize.
    pub store: Option<Arc<dyn PropertyStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn PropertyStore>>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The store, with the `location` geo index ensured
    ///
    /// A rejected index request is ignored; an unreachable store is not.
    pub async fn ready_store(&self) -> Result<&Arc<dyn PropertyStore>, ApiError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("store not initialized".to_string()))?;

        match store.ensure_geo_index().await? {
            IndexOutcome::Created => debug!("Geo index on location ready"),
            IndexOutcome::Rejected(reason) => debug!("Geo index not created: {}", reason),
        }

        Ok(store)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/hello", get(handlers::hello))
        .route("/test", get(diagnostics::check))
        .route(
            "/api/properties",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route("/api/properties/search", post(handlers::search_properties))
        .route("/api/properties/seed", post(handlers::seed_properties))
        // Mirrors the caller's origin so credentials stay allowed.
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
