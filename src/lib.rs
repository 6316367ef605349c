//! HTTP API for real-estate listings with polygon search over a geo-indexed
//! document store.

pub mod api;
pub mod config;
pub mod models;
pub mod store;

pub use api::{router, AppState};
pub use config::Config;
pub use store::{MemoryStore, MongoStore, PropertyStore};
