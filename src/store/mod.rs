pub mod memory;
pub mod mongo;

use crate::models::{Property, PropertyDetails, SearchRegion};
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Collection holding every listing
pub const PROPERTY_COLLECTION: &str = "property";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// No store configured, or the store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but refused the operation.
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Result of asking the store for the `location` geo index
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
    Created,
    /// The store answered but did not create the index (usually it exists already).
    Rejected(String),
}

/// Attribute filters, an optional search region and a result cap
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyQuery {
    pub filters: Map<String, Value>,
    pub region: Option<SearchRegion>,
    pub limit: u32,
}

impl PropertyQuery {
    pub fn all(limit: u32) -> Self {
        Self {
            filters: Map::new(),
            region: None,
            limit,
        }
    }

    /// The region always wins over a `location` filter.
    pub fn within(region: SearchRegion, mut filters: Map<String, Value>, limit: u32) -> Self {
        if filters.remove("location").is_some() {
            debug!("Dropping location filter in favour of search polygon");
        }
        Self {
            filters,
            region: Some(region),
            limit,
        }
    }
}

/// Persistence for property listings
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Name of the backing database
    fn database_name(&self) -> &str;

    /// Make sure a geospatial index exists on `location`
    async fn ensure_geo_index(&self) -> Result<IndexOutcome, StoreError>;

    /// Persist one listing and return its new identifier
    async fn insert(&self, details: &PropertyDetails) -> Result<String, StoreError>;

    /// Listings matching the query, in store order
    ///
    /// Stored documents that cannot be read as a `Property` are skipped, so
    /// they count neither toward the result cap nor toward any listing.
    async fn find(&self, query: &PropertyQuery) -> Result<Vec<Property>, StoreError>;

    async fn collection_names(&self) -> Result<Vec<String>, StoreError>;
}
