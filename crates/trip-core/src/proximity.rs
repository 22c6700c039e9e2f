//! Filtering places by distance to a route and by preference keywords.

use crate::models::{Coordinate, PlaceRecord};
use crate::spatial::point_to_polyline_km;

/// Search radius around the route when none is configured.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Keywords shorter than this (in characters) are ignored.
const MIN_KEYWORD_CHARS: usize = 3;

/// Places within `radius_km` of `polyline`, narrowed by `preferences`.
///
/// Output keeps the order of `places`. An empty preference text skips the
/// keyword step; otherwise a place is kept when its name, category or
/// description contains any keyword (or the singular of a plural keyword,
/// so "museums" finds a "Museum").
pub fn filter_near<'a>(
    places: &'a [PlaceRecord],
    polyline: &[Coordinate],
    radius_km: f64,
    preferences: &str,
) -> Vec<&'a PlaceRecord> {
    if polyline.is_empty() {
        return Vec::new();
    }

    let nearby = places.iter().filter(|place| {
        point_to_polyline_km(place.coordinates, polyline).is_some_and(|dist| dist <= radius_km)
    });

    if preferences.trim().is_empty() {
        return nearby.collect();
    }

    let keywords = preference_keywords(preferences);
    nearby
        .filter(|place| matches_any_keyword(place, &keywords))
        .collect()
}

/// Lower-cased whitespace tokens of at least three characters.
pub fn preference_keywords(preferences: &str) -> Vec<String> {
    preferences
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .map(str::to_string)
        .collect()
}

fn matches_any_keyword(place: &PlaceRecord, keywords: &[String]) -> bool {
    let text = format!("{} {} {}", place.name, place.category, place.description).to_lowercase();
    keywords.iter().any(|keyword| {
        text.contains(keyword.as_str())
            || keyword
                .strip_suffix('s')
                .is_some_and(|stem| stem.chars().count() >= MIN_KEYWORD_CHARS && text.contains(stem))
    })
}
