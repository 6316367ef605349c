use crate::models::{Property, PropertyDetails, SearchRegion};
use crate::store::{IndexOutcome, PropertyQuery, PropertyStore, StoreError, PROPERTY_COLLECTION};
use async_trait::async_trait;
use geo::{Intersects, LineString, Point, Polygon};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-process property store
///
/// Polygon edges are straight lines in raw longitude/latitude here, while
/// MongoDB's `$geoWithin` follows great-circle edges. The two agree closely
/// only for small regions.
pub struct MemoryStore {
    name: String,
    properties: RwLock<Vec<Property>>,
    next_id: AtomicU64,
    geo_index: AtomicBool,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            geo_index: AtomicBool::new(false),
        }
    }

    pub async fn len(&self) -> usize {
        self.properties.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

fn position(raw: &[f64]) -> Result<(f64, f64), StoreError> {
    match raw {
        [x, y] => Ok((*x, *y)),
        _ => Err(StoreError::Operation(format!(
            "Point must only contain numeric elements, got {} values",
            raw.len()
        ))),
    }
}

/// Planar polygon for `region`, rejecting the shapes MongoDB refuses
fn to_polygon(region: &SearchRegion) -> Result<Polygon<f64>, StoreError> {
    let mut rings = region
        .coordinates
        .iter()
        .map(|ring| {
            let ring = ring
                .iter()
                .map(|p| position(p))
                .collect::<Result<Vec<_>, _>>()?;
            if ring.len() < 4 {
                return Err(StoreError::Operation(
                    "Loop must have at least 3 different vertices".to_string(),
                ));
            }
            if ring.first() != ring.last() {
                return Err(StoreError::Operation(
                    "Loop is not closed, first vertex does not equal last vertex".to_string(),
                ));
            }
            Ok(LineString::from(ring))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    let exterior = rings
        .next()
        .ok_or_else(|| StoreError::Operation("Polygon has no loops".to_string()))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

/// Equality the way MongoDB compares: numbers by value regardless of width.
fn same_value(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| same_value(v, w)))
        }
        _ => actual == expected,
    }
}

fn matches(
    property: &Property,
    query: &PropertyQuery,
    region: Option<&Polygon<f64>>,
) -> bool {
    if let Some(polygon) = region {
        // Boundary points intersect, so they count as inside.
        match property.details.location.position() {
            Some((x, y)) if polygon.intersects(&Point::new(x, y)) => {}
            _ => return false,
        }
    }

    if query.filters.is_empty() {
        return true;
    }

    let document = match serde_json::to_value(&property.details) {
        Ok(document) => document,
        Err(_) => return false,
    };
    query.filters.iter().all(|(key, expected)| {
        let actual = document.get(key).unwrap_or(&Value::Null);
        same_value(actual, expected)
    })
}

#[async_trait]
impl PropertyStore for MemoryStore {
    fn database_name(&self) -> &str {
        &self.name
    }

    async fn ensure_geo_index(&self) -> Result<IndexOutcome, StoreError> {
        if self.geo_index.swap(true, Ordering::SeqCst) {
            Ok(IndexOutcome::Rejected("index already exists".to_string()))
        } else {
            Ok(IndexOutcome::Created)
        }
    }

    async fn insert(&self, details: &PropertyDetails) -> Result<String, StoreError> {
        let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.properties.write().await.push(Property {
            id: id.clone(),
            details: details.clone(),
        });
        debug!("Inserted property {}", id);
        Ok(id)
    }

    async fn find(&self, query: &PropertyQuery) -> Result<Vec<Property>, StoreError> {
        let region = query.region.as_ref().map(to_polygon).transpose()?;

        let properties = self.properties.read().await;
        Ok(properties
            .iter()
            .filter(|p| matches(p, query, region.as_ref()))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let populated = self.geo_index.load(Ordering::SeqCst) || !self.is_empty().await;
        Ok(if populated {
            vec![PROPERTY_COLLECTION.to_string()]
        } else {
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed::demo_properties;
    use serde_json::json;

    fn square(min: [f64; 2], max: [f64; 2]) -> SearchRegion {
        SearchRegion::polygon(vec![vec![
            [min[0], min[1]],
            [max[0], min[1]],
            [max[0], max[1]],
            [min[0], max[1]],
            [min[0], min[1]],
        ]])
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        for details in demo_properties() {
            store.insert(&details).await.unwrap();
        }
        store
    }

    fn inside(region: &SearchRegion, x: f64, y: f64) -> bool {
        to_polygon(region).unwrap().intersects(&Point::new(x, y))
    }

    #[test]
    fn boundary_points_are_inside() {
        let region = square([0.0, 0.0], [2.0, 2.0]);
        assert!(inside(&region, 1.0, 1.0));
        assert!(inside(&region, 2.0, 1.0));
        assert!(inside(&region, 0.0, 0.0));
        assert!(!inside(&region, 2.5, 1.0));
    }

    #[test]
    fn holes_exclude_their_interior() {
        let region = SearchRegion::polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]],
        ]);
        assert!(inside(&region, 1.0, 1.0));
        assert!(!inside(&region, 5.0, 5.0));
        assert!(inside(&region, 4.0, 5.0));
    }

    #[test]
    fn empty_region_is_an_operation_error() {
        let region = SearchRegion {
            kind: "Polygon".to_string(),
            coordinates: vec![],
        };
        assert!(matches!(to_polygon(&region), Err(StoreError::Operation(_))));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(same_value(&json!(450000.0), &json!(450000)));
        assert!(!same_value(&json!(1), &json!("1")));
        assert!(same_value(&Value::Null, &Value::Null));
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = MemoryStore::default();
        let details = demo_properties().remove(0);
        let a = store.insert(&details).await.unwrap();
        let b = store.insert(&details).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 24);
    }

    #[tokio::test]
    async fn finds_within_region() {
        let store = seeded().await;

        let tokyo = PropertyQuery::within(square([139.0, 35.0], [140.5, 36.0]), Default::default(), 100);
        let found = store.find(&tokyo).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].details.title, "Shibuya Studio");

        let ocean = PropertyQuery::within(square([-40.0, -10.0], [-30.0, 0.0]), Default::default(), 100);
        assert!(store.find(&ocean).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn combines_filters_with_region() {
        let store = seeded().await;
        let world = square([-180.0, -90.0], [180.0, 90.0]);

        let filters = json!({"country": "USA"}).as_object().cloned().unwrap();
        let found = store
            .find(&PropertyQuery::within(world.clone(), filters, 100))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let filters = json!({"price": 920000}).as_object().cloned().unwrap();
        let found = store
            .find(&PropertyQuery::within(world, filters, 100))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].details.city.as_deref(), Some("London"));
    }

    #[tokio::test]
    async fn missing_field_matches_null_filter() {
        let store = seeded().await;
        let filters = json!({"bedrooms": null}).as_object().cloned().unwrap();
        let query = PropertyQuery {
            filters,
            region: None,
            limit: 100,
        };
        assert_eq!(store.find(&query).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn limit_caps_results() {
        let store = seeded().await;
        assert_eq!(store.find(&PropertyQuery::all(4)).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unclosed_ring_is_an_operation_error() {
        let store = seeded().await;
        let region = SearchRegion::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]);
        let result = store
            .find(&PropertyQuery::within(region, Default::default(), 10))
            .await;
        assert!(matches!(result, Err(StoreError::Operation(_))));
    }

    #[tokio::test]
    async fn second_index_request_is_rejected() {
        let store = MemoryStore::default();
        assert!(store.collection_names().await.unwrap().is_empty());
        assert_eq!(store.ensure_geo_index().await.unwrap(), IndexOutcome::Created);
        assert!(matches!(
            store.ensure_geo_index().await.unwrap(),
            IndexOutcome::Rejected(_)
        ));
        assert_eq!(store.collection_names().await.unwrap(), vec!["property"]);
    }
}
