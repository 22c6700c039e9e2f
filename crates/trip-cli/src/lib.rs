//! Trip CLI - command line tools for the trip planning server.
//!
//! This crate provides:
//! - plan_trip: walks a planning conversation and prints the result

use trip_core::conversation::ChatResponse;
use trip_core::models::Coordinate;

/// Parse a `lat,lng` argument.
pub fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{s}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    let coord = Coordinate::new(lat, lng);
    coord.validate().map_err(|e| e.to_string())?;
    Ok(coord)
}

/// Human-readable summary of a finished plan.
pub fn render_plan(plan: &ChatResponse) -> String {
    let mut out = String::new();
    if let Some(fastest) = &plan.fastest_route {
        out.push_str(&format!(
            "Fastest route: {:.1} km, {} ({} points)\n",
            fastest.distance_km,
            fastest.time,
            fastest.polyline.len()
        ));
    }
    if let Some(scenic) = &plan.scenic_route {
        out.push_str(&format!(
            "Scenic route: {} recommended places\n",
            scenic.recommended_places.len()
        ));
        for (i, place) in scenic.recommended_places.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} ({:.4}, {:.4})",
                i + 1,
                place.name,
                place.coordinates.lat,
                place.coordinates.lng
            ));
            if !place.match_reason.is_empty() {
                out.push_str(&format!(" - {}", place.match_reason));
            }
            out.push('\n');
        }
    }
    if let Some(explanation) = &plan.explanation {
        out.push('\n');
        out.push_str(explanation);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_core::models::{FastestRoute, RecommendedPlace, ScenicRoute};

    #[test]
    fn parses_lat_lng_pairs() {
        assert_eq!(parse_coordinate("47.92, 106.92"), Ok(Coordinate::new(47.92, 106.92)));
        assert!(parse_coordinate("47.92").is_err());
        assert!(parse_coordinate("abc,1").is_err());
        assert!(parse_coordinate("106.92,47.92").is_err());
        assert!(parse_coordinate("-33.9,151.2").is_ok());
        assert!(parse_coordinate("120,47").is_err());
    }

    #[test]
    fn renders_routes_and_places() {
        let plan = ChatResponse {
            fastest_route: Some(FastestRoute {
                distance_km: 74.52,
                time: "1h 15m".to_string(),
                polyline: vec![Coordinate::new(47.92, 106.92), Coordinate::new(47.92, 107.92)],
            }),
            scenic_route: Some(ScenicRoute {
                recommended_places: vec![RecommendedPlace {
                    name: "National Museum".to_string(),
                    coordinates: Coordinate::new(47.93, 107.2),
                    description: String::new(),
                    match_reason: "museums".to_string(),
                }],
                polyline: vec![],
            }),
            explanation: Some("Enjoy.".to_string()),
            ..ChatResponse::default()
        };
        let text = render_plan(&plan);
        assert!(text.contains("Fastest route: 74.5 km, 1h 15m (2 points)"));
        assert!(text.contains("1. National Museum (47.9300, 107.2000) - museums"));
        assert!(text.ends_with("Enjoy.\n"));
    }
}
