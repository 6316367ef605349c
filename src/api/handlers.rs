use crate::api::{ApiError, AppState};
use crate::models::seed::demo_properties;
use crate::models::{Property, PropertyDetails, SearchRegion, ValidationError};
use crate::store::PropertyQuery;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

pub const DEFAULT_LIST_LIMIT: u32 = 1000;
pub const DEFAULT_SEARCH_LIMIT: u32 = 5000;

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyList {
    pub items: Vec<Property>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Seeded {
    pub inserted: usize,
}

/// `?limit=` on the read endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    fn resolve(&self, default: u32) -> Result<u32, ValidationError> {
        match self.limit {
            None => Ok(default),
            Some(n) if n > 0 => Ok(u32::try_from(n).unwrap_or(u32::MAX)),
            Some(n) => Err(ValidationError::field(
                "limit",
                format!("must be a positive integer, got {}", n),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub polygon: SearchRegion,
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
}

impl SearchBody {
    /// Filters are plain attribute names; query operators are refused.
    fn validate(&self) -> Result<(), ValidationError> {
        self.polygon.validate()?;
        let operator = self
            .filters
            .iter()
            .flat_map(|filters| filters.keys())
            .find(|key| key.starts_with('$'));
        match operator {
            Some(key) => Err(ValidationError::field(
                format!("filters.{}", key),
                "filter keys must be attribute names, not query operators",
            )),
            None => Ok(()),
        }
    }
}

pub async fn root() -> Json<Message> {
    Json(Message {
        message: "Hello from the Property Map backend!".to_string(),
    })
}

pub async fn hello() -> Json<Message> {
    Json(Message {
        message: "Hello from the backend API!".to_string(),
    })
}

pub async fn list_properties(
    State(state): State<AppState>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<PropertyList>, ApiError> {
    let Query(params) = params?;
    let limit = params.resolve(DEFAULT_LIST_LIMIT)?;

    let store = state.ready_store().await?;
    let items = store.find(&PropertyQuery::all(limit)).await?;

    info!("Listed {} properties (limit {})", items.len(), limit);
    Ok(Json(PropertyList { items }))
}

pub async fn search_properties(
    State(state): State<AppState>,
    params: Result<Query<LimitParams>, QueryRejection>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<PropertyList>, ApiError> {
    let Query(params) = params?;
    let limit = params.resolve(DEFAULT_SEARCH_LIMIT)?;
    let Json(body) = body?;
    body.validate()?;

    let query = PropertyQuery::within(body.polygon, body.filters.unwrap_or_default(), limit);
    let store = state.ready_store().await?;
    let items = store.find(&query).await?;

    info!(
        "Found {} properties in polygon with {} filter(s)",
        items.len(),
        query.filters.len()
    );
    Ok(Json(PropertyList { items }))
}

pub async fn create_property(
    State(state): State<AppState>,
    payload: Result<Json<PropertyDetails>, JsonRejection>,
) -> Result<Json<Created>, ApiError> {
    let Json(details) = payload?;
    details.validate()?;

    let store = state.ready_store().await?;
    let id = store.insert(&details).await?;

    info!("Created property {} ({})", id, details.title);
    Ok(Json(Created { id }))
}

/// Not idempotent: every call inserts the full demo set again.
pub async fn seed_properties(State(state): State<AppState>) -> Result<Json<Seeded>, ApiError> {
    let store = state.ready_store().await?;

    let sample = demo_properties();
    for details in &sample {
        store.insert(details).await?;
    }

    info!("💾 Seeded {} demo properties", sample.len());
    Ok(Json(Seeded {
        inserted: sample.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(LimitParams::default().resolve(1000).unwrap(), 1000);
        assert_eq!(LimitParams { limit: Some(5) }.resolve(1000).unwrap(), 5);
        assert_eq!(
            LimitParams {
                limit: Some(i64::MAX)
            }
            .resolve(1000)
            .unwrap(),
            u32::MAX
        );
        assert!(LimitParams { limit: Some(0) }.resolve(1000).is_err());
        assert!(LimitParams { limit: Some(-3) }.resolve(1000).is_err());
    }

    #[test]
    fn search_body_filters_are_optional() {
        let body: SearchBody = serde_json::from_str(
            r#"{"polygon": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}"#,
        )
        .unwrap();
        assert!(body.filters.is_none());
        assert!(body.validate().is_ok());
    }

    #[test]
    fn search_body_refuses_operator_keys() {
        let body: SearchBody = serde_json::from_str(
            r#"{"polygon": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]},
                "filters": {"city": "Tokyo", "$where": "sleep(5000) || true"}}"#,
        )
        .unwrap();
        let err = body.validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("filters.$where"));
    }
}
