//! Point-of-interest dataset loading.
//!
//! The index is loaded once at startup and shared read-only afterwards.
//! The source file is GeoJSON-like: every feature carries its attributes in
//! `properties`, including `FID`, `Name_TXT`, `Type_TXT`, `Sub_type_T` and
//! the coordinate pair `Lat` / `Long_`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Coordinate, PlaceRecord};

/// How the dataset's `Lat` / `Long_` fields map onto (latitude, longitude).
///
/// The archaeology dataset stores longitude in `Lat` and latitude in
/// `Long_` (values around 105 and 41 respectively for Mongolia), hence the
/// `Swapped` default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateOrder {
    #[default]
    Swapped,
    AsNamed,
}

impl FromStr for CoordinateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "swapped" => Ok(Self::Swapped),
            "as_named" | "as-named" | "named" => Ok(Self::AsNamed),
            other => Err(format!("unknown coordinate order '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlaceIndexError {
    #[error("failed to read place dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse place dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Default)]
struct LoadStats {
    missing_coordinates: usize,
    out_of_range: usize,
}

/// Immutable collection of places, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct PlaceIndex {
    places: Vec<PlaceRecord>,
}

impl PlaceIndex {
    pub fn new(places: Vec<PlaceRecord>) -> Self {
        Self { places }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and normalize the dataset at `path`.
    pub fn load(path: impl AsRef<Path>, order: CoordinateOrder) -> Result<Self, PlaceIndexError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PlaceIndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json_str(&content, order)?;
        tracing::info!("Loaded {} places from {}", index.len(), path.display());
        Ok(index)
    }

    /// Like [`PlaceIndex::load`], but a failed load yields an empty index.
    pub fn load_or_empty(path: impl AsRef<Path>, order: CoordinateOrder) -> Self {
        match Self::load(path, order) {
            Ok(index) => index,
            Err(err) => {
                tracing::error!("Place dataset unavailable, continuing without places: {}", err);
                Self::empty()
            }
        }
    }

    /// Parse dataset JSON. Records with missing, non-finite or out-of-range
    /// coordinates are dropped.
    pub fn from_json_str(json: &str, order: CoordinateOrder) -> Result<Self, PlaceIndexError> {
        let dataset: RawDataset = serde_json::from_str(json)?;
        let total = dataset.features.len();
        let mut stats = LoadStats::default();

        let places: Vec<PlaceRecord> = dataset
            .features
            .into_iter()
            .enumerate()
            .filter_map(|(position, feature)| {
                normalize_feature(position, feature.properties.as_ref()?, order, &mut stats)
            })
            .collect();

        let dropped = total - places.len();
        if dropped > 0 {
            tracing::debug!(
                dropped,
                missing = stats.missing_coordinates,
                out_of_range = stats.out_of_range,
                "Skipped place records without usable coordinates"
            );
        }
        if total > 0 && stats.out_of_range * 2 > total {
            tracing::warn!(
                "{} of {} places have out-of-range coordinates; check the coordinate order ({:?})",
                stats.out_of_range,
                total,
                order
            );
        }

        Ok(Self { places })
    }

    /// All places in dataset order. Served from memory on every call.
    pub fn all_places(&self) -> &[PlaceRecord] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn normalize_feature(
    position: usize,
    props: &Map<String, Value>,
    order: CoordinateOrder,
    stats: &mut LoadStats,
) -> Option<PlaceRecord> {
    let named_lat = number_field(props.get("Lat"));
    let named_long = number_field(props.get("Long_"));
    let (lat, lng) = match order {
        CoordinateOrder::Swapped => (named_long, named_lat),
        CoordinateOrder::AsNamed => (named_lat, named_long),
    };
    let (Some(lat), Some(lng)) = (lat, lng) else {
        stats.missing_coordinates += 1;
        return None;
    };

    let coordinates = Coordinate::new(lat, lng);
    if !coordinates.is_valid() {
        stats.out_of_range += 1;
        return None;
    }

    let id = props
        .get("FID")
        .and_then(|v| v.as_i64().or_else(|| v.as_str()?.trim().parse().ok()))
        .unwrap_or(position as i64);
    let category = text_field(props.get("Type_TXT")).unwrap_or_default();
    let description = text_field(props.get("Sub_type_T")).unwrap_or_else(|| category.clone());

    Some(PlaceRecord {
        id,
        name: text_field(props.get("Name_TXT")).unwrap_or_default(),
        category,
        description,
        coordinates,
    })
}

fn number_field(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
