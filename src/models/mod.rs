pub mod seed;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A request field that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// GeoJSON Point, `[longitude, latitude]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![longitude, latitude],
        }
    }

    /// `(longitude, latitude)` when the point is well formed
    pub fn position(&self) -> Option<(f64, f64)> {
        match self.coordinates.as_slice() {
            [lon, lat] if self.kind == "Point" => Some((*lon, *lat)),
            _ => None,
        }
    }

    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        if self.kind != "Point" {
            return Err(ValidationError::field(
                format!("{field}.type"),
                format!("expected \"Point\", got \"{}\"", self.kind),
            ));
        }
        check_position(&self.coordinates, &format!("{field}.coordinates"))
    }
}

/// GeoJSON Polygon used to scope a search. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRegion {
    #[serde(rename = "type")]
    pub kind: String,
    /// Linear rings; the first is the outer boundary, the rest are holes.
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

impl SearchRegion {
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Self {
            kind: "Polygon".to_string(),
            coordinates: rings
                .into_iter()
                .map(|ring| ring.into_iter().map(|p| p.to_vec()).collect())
                .collect(),
        }
    }

    /// Ring closure is left to the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind != "Polygon" {
            return Err(ValidationError::field(
                "polygon.type",
                format!("expected \"Polygon\", got \"{}\"", self.kind),
            ));
        }
        if self.coordinates.is_empty() {
            return Err(ValidationError::field(
                "polygon.coordinates",
                "polygon needs at least one ring",
            ));
        }
        for (r, ring) in self.coordinates.iter().enumerate() {
            if ring.is_empty() {
                return Err(ValidationError::field(
                    format!("polygon.coordinates[{r}]"),
                    "ring has no positions",
                ));
            }
            for (p, position) in ring.iter().enumerate() {
                check_position(position, &format!("polygon.coordinates[{r}][{p}]"))?;
            }
        }
        Ok(())
    }
}

fn check_position(position: &[f64], field: &str) -> Result<(), ValidationError> {
    if position.len() != 2 {
        return Err(ValidationError::field(
            field,
            format!(
                "expected [longitude, latitude], got {} values",
                position.len()
            ),
        ));
    }
    if position.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::field(field, "coordinates must be finite"));
    }
    Ok(())
}

/// Listing attributes as supplied by clients and stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDetails {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    /// Half-baths allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub location: GeoPoint,
}

impl PropertyDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::field("title", "title must not be empty"));
        }
        check_amount(self.price, "price")?;
        check_amount(self.bathrooms, "bathrooms")?;
        self.location.validate("location")
    }
}

fn check_amount(value: Option<f64>, field: &str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::field(
            field,
            "must be a non-negative number",
        )),
        _ => Ok(()),
    }
}

/// A stored listing as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: String,
    #[serde(flatten)]
    pub details: PropertyDetails,
}
