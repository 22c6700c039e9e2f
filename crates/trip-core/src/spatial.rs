//! Spatial math for route distances and point-to-route proximity.

use crate::models::{Coordinate, RouteResult};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Average speed assumed when no road route exists.
pub const OFF_ROAD_SPEED_KMH: f64 = 60.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng) / 1000.0
}

/// Calculate initial bearing from point 1 to point 2 in radians.
/// Returns bearing in radians, 0 = north, π/2 = east.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Minimum great-circle distance from a point to a segment, in meters.
///
/// Uses cross-track / along-track decomposition so long segments (such as
/// a straight-line fallback route) are measured on the sphere rather than in
/// a flat projection. Points that project before the start or past the end
/// of the segment are measured to the nearer endpoint.
pub fn distance_to_segment_m(point: Coordinate, seg_start: Coordinate, seg_end: Coordinate) -> f64 {
    let d12_m = haversine_distance(seg_start.lat, seg_start.lng, seg_end.lat, seg_end.lng);
    let d13_m = haversine_distance(seg_start.lat, seg_start.lng, point.lat, point.lng);

    if d12_m < 0.01 || d13_m < 0.01 {
        return d13_m;
    }

    let theta12 = bearing(seg_start.lat, seg_start.lng, seg_end.lat, seg_end.lng);
    let theta13 = bearing(seg_start.lat, seg_start.lng, point.lat, point.lng);
    let delta = theta13 - theta12;

    // Behind the start of the segment.
    if delta.cos() < 0.0 {
        return d13_m;
    }

    let d13 = d13_m / EARTH_RADIUS_M;
    let cross_track = (d13.sin() * delta.sin()).clamp(-1.0, 1.0).asin();
    let along_track = (d13.cos() / cross_track.cos()).clamp(-1.0, 1.0).acos() * EARTH_RADIUS_M;

    if along_track > d12_m {
        return haversine_distance(seg_end.lat, seg_end.lng, point.lat, point.lng);
    }

    cross_track.abs() * EARTH_RADIUS_M
}

/// Minimum distance from a point to a polyline in kilometers.
///
/// A single-point polyline degenerates to point distance. Returns `None`
/// for an empty polyline.
pub fn point_to_polyline_km(point: Coordinate, polyline: &[Coordinate]) -> Option<f64> {
    match polyline {
        [] => None,
        [only] => Some(haversine_km(point, *only)),
        _ => polyline
            .windows(2)
            .map(|seg| distance_to_segment_m(point, seg[0], seg[1]) / 1000.0)
            .min_by(f64::total_cmp),
    }
}

/// Synthetic route used when no road route is available.
pub fn straight_line_route(start: Coordinate, end: Coordinate) -> RouteResult {
    let distance_km = haversine_km(start, end);
    RouteResult {
        distance_km,
        time_minutes: distance_km / OFF_ROAD_SPEED_KMH * 60.0,
        coordinates: vec![start, end],
        is_fallback: true,
    }
}
