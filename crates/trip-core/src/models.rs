//! Core data models for trip planning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geographic point in canonical (latitude, longitude) order.
///
/// Serialized as a two-element `[lat, lng]` array, the shape map clients use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate ({lat}, {lng}) is not finite")]
    NotFinite { lat: f64, lng: f64 },
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both components are finite and within WGS84 bounds.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordinateError::NotFinite {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lat, coord.lng]
    }
}

/// A drivable (or synthetic) route between two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub distance_km: f64,
    pub time_minutes: f64,
    /// Ordered path; first point is the start, last is the end.
    pub coordinates: Vec<Coordinate>,
    /// True when the routing service was unavailable and this is a straight line.
    #[serde(skip)]
    pub is_fallback: bool,
}

/// A point of interest from the static dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub coordinates: Coordinate,
}

/// The subset of a place handed to the language model.
#[derive(Debug, Clone, Serialize)]
pub struct CandidatePlace<'a> {
    pub id: i64,
    pub name: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub coordinates: Coordinate,
}

impl<'a> From<&'a PlaceRecord> for CandidatePlace<'a> {
    fn from(place: &'a PlaceRecord) -> Self {
        Self {
            id: place.id,
            name: &place.name,
            category: &place.category,
            description: &place.description,
            coordinates: place.coordinates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastestRoute {
    pub distance_km: f64,
    /// Human-readable duration such as `"2h 5m"`.
    pub time: String,
    pub polyline: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPlace {
    pub name: String,
    pub coordinates: Coordinate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub match_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenicRoute {
    pub recommended_places: Vec<RecommendedPlace>,
    pub polyline: Vec<Coordinate>,
}

/// Final plan returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPlan {
    pub fastest_route: FastestRoute,
    pub scenic_route: ScenicRoute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
