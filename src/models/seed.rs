use crate::models::{GeoPoint, PropertyDetails};
use tracing::info;

#[allow(clippy::too_many_arguments)]
fn listing(
    title: &str,
    price: f64,
    city: &str,
    country: &str,
    kind: &str,
    status: &str,
    longitude: f64,
    latitude: f64,
) -> PropertyDetails {
    PropertyDetails {
        title: title.to_string(),
        price: Some(price),
        bedrooms: None,
        bathrooms: None,
        address: None,
        city: Some(city.to_string()),
        country: Some(country.to_string()),
        kind: Some(kind.to_string()),
        status: Some(status.to_string()),
        color: None,
        location: GeoPoint::new(longitude, latitude),
    }
}

/// Demo listings, one per city, for trying out the map
pub fn demo_properties() -> Vec<PropertyDetails> {
    info!("📋 Generating demo properties across six cities");

    vec![
        listing(
            "SoMa Loft",
            1_250_000.0,
            "San Francisco",
            "USA",
            "apartment",
            "for sale",
            -122.4009,
            37.7817,
        ),
        listing(
            "Brooklyn Brownstone",
            2_100_000.0,
            "New York",
            "USA",
            "house",
            "for sale",
            -73.9442,
            40.6782,
        ),
        listing(
            "Downtown Condo",
            680_000.0,
            "Toronto",
            "Canada",
            "condo",
            "for sale",
            -79.3832,
            43.6532,
        ),
        listing(
            "Shibuya Studio",
            450_000.0,
            "Tokyo",
            "Japan",
            "apartment",
            "for rent",
            139.7006,
            35.6595,
        ),
        listing(
            "Canary Wharf Flat",
            920_000.0,
            "London",
            "UK",
            "apartment",
            "for sale",
            -0.0195,
            51.5054,
        ),
        listing(
            "Bondi Beach House",
            1_850_000.0,
            "Sydney",
            "Australia",
            "house",
            "for sale",
            151.2743,
            -33.8908,
        ),
    ]
}
