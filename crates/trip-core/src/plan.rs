//! Prompt construction and reconciliation of model output with route data.
//!
//! The model picks places and writes the narrative. Distances, durations and
//! polylines always come from the computed route.

use serde_json::Value;

use crate::conversation::TripRequest;
use crate::models::{
    CandidatePlace, FastestRoute, RecommendedPlace, RouteResult, ScenicRoute, TripPlan,
};

/// Format a duration in minutes as `"{hours}h {minutes}m"`.
pub fn format_duration(minutes: f64) -> String {
    let total = if minutes.is_finite() && minutes > 0.0 {
        minutes.round() as u64
    } else {
        0
    };
    format!("{}h {}m", total / 60, total % 60)
}

/// Instruction sent to the language model.
pub fn build_prompt(
    request: &TripRequest,
    route: &RouteResult,
    candidates: &[CandidatePlace<'_>],
) -> String {
    let candidates_json = serde_json::to_string(candidates).unwrap_or_else(|_| "[]".to_string());
    let fallback_note = if route.is_fallback {
        "\nNote: Could not find a road route, using straight line distance.\n"
    } else {
        ""
    };

    format!(
        r#"You are an AI travel-planning assistant.
The user is planning a {days}-day trip.
Preferences: {preferences}.

I have calculated the fastest driving route:
- Distance: {distance:.1} km
- Time: {time:.0} minutes
{fallback_note}
Here is a list of candidate places along the route:
{candidates_json}

Your task:
1. Select the best places from the candidate list that match the user's preferences.
2. Create a "Scenic Route" plan.
3. Return a JSON object with the structure defined below.
4. Provide a natural language explanation of the route and recommendations.

Output Format (JSON only):
{{
  "fastestRoute": {{
    "distanceKm": number,
    "time": string,
    "polyline": [[lat, lng], ...]
  }},
  "scenicRoute": {{
    "recommendedPlaces": [
      {{
        "name": string,
        "coordinates": [lat, lng],
        "description": string,
        "matchReason": string
      }}
    ],
    "polyline": [[lat, lng], ...]
  }},
  "explanation": "Natural language summary..."
}}
"#,
        days = request.days,
        preferences = request.preferences,
        distance = route.distance_km,
        time = route.time_minutes,
    )
}

/// The parts of a model response that are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelPlan {
    pub recommended_places: Vec<RecommendedPlace>,
    pub explanation: Option<String>,
    /// True when the response was not a JSON object and only the raw text
    /// survived as the explanation.
    pub degraded: bool,
}

impl ModelPlan {
    fn degraded(raw: &str) -> Self {
        Self {
            recommended_places: Vec::new(),
            explanation: Some(raw.to_string()),
            degraded: true,
        }
    }
}

/// Parse the model's text response.
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence. Recommended
/// places with unusable coordinates are skipped, as is a scenic route of the
/// wrong shape. Only output that is not a JSON object degrades to an
/// explanation-only plan.
pub fn parse_model_output(raw: &str) -> ModelPlan {
    let body = strip_code_fence(raw.trim());

    let mut plan = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(plan)) => plan,
        Ok(_) => {
            tracing::warn!("Model response is JSON but not an object; using raw text");
            return ModelPlan::degraded(raw);
        }
        Err(err) => {
            tracing::warn!("Model response is not valid JSON ({}); using raw text", err);
            return ModelPlan::degraded(raw);
        }
    };

    // Malformed sections are ignored; only the fields that decode are kept.
    let raw_places = match plan
        .get_mut("scenicRoute")
        .and_then(|scenic| scenic.get_mut("recommendedPlaces"))
        .map(Value::take)
    {
        Some(Value::Array(places)) => places,
        _ => Vec::new(),
    };
    let offered = raw_places.len();
    let recommended_places: Vec<RecommendedPlace> = raw_places
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RecommendedPlace>(value).ok())
        .filter(|place| place.coordinates.is_valid())
        .collect();
    if recommended_places.len() < offered {
        tracing::debug!(
            offered,
            kept = recommended_places.len(),
            "Dropped recommended places without usable coordinates"
        );
    }

    let explanation = match plan.remove("explanation") {
        Some(Value::String(text)) => Some(text),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };

    ModelPlan {
        recommended_places,
        explanation,
        degraded: false,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Merge the model's selections with the authoritative route.
pub fn reconcile(model: ModelPlan, route: &RouteResult) -> TripPlan {
    TripPlan {
        fastest_route: FastestRoute {
            distance_km: route.distance_km,
            time: format_duration(route.time_minutes),
            polyline: route.coordinates.clone(),
        },
        scenic_route: ScenicRoute {
            recommended_places: model.recommended_places,
            polyline: route.coordinates.clone(),
        },
        explanation: model.explanation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, PlaceRecord};
    use crate::spatial::straight_line_route;

    fn road_route() -> RouteResult {
        RouteResult {
            distance_km: 82.4,
            time_minutes: 125.4,
            coordinates: vec![
                Coordinate::new(47.92, 106.92),
                Coordinate::new(47.95, 107.4),
                Coordinate::new(47.92, 107.92),
            ],
            is_fallback: false,
        }
    }

    fn request() -> TripRequest {
        TripRequest {
            start: Coordinate::new(47.92, 106.92),
            end: Coordinate::new(47.92, 107.92),
            days: 4,
            preferences: "museums history".to_string(),
        }
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(125.4), "2h 5m");
        assert_eq!(format_duration(59.6), "1h 0m");
        assert_eq!(format_duration(0.0), "0h 0m");
        assert_eq!(format_duration(f64::NAN), "0h 0m");
        assert_eq!(format_duration(600.0), "10h 0m");
    }

    #[test]
    fn prompt_carries_request_route_and_candidates() {
        let place = PlaceRecord {
            id: 7,
            name: "National Museum".to_string(),
            category: "Museum".to_string(),
            description: "History museum".to_string(),
            coordinates: Coordinate::new(47.93, 107.2),
        };
        let candidates = vec![CandidatePlace::from(&place)];
        let prompt = build_prompt(&request(), &road_route(), &candidates);

        assert!(prompt.contains("planning a 4-day trip"));
        assert!(prompt.contains("Preferences: museums history."));
        assert!(prompt.contains("Distance: 82.4 km"));
        assert!(prompt.contains("Time: 125 minutes"));
        assert!(prompt.contains(r#""name":"National Museum""#));
        assert!(prompt.contains(r#""coordinates":[47.93,107.2]"#));
        assert!(!prompt.contains("straight line"));
    }

    #[test]
    fn prompt_mentions_straight_line_fallback() {
        let route = straight_line_route(Coordinate::new(47.92, 106.92), Coordinate::new(47.92, 107.92));
        let prompt = build_prompt(&request(), &route, &[]);
        assert!(prompt.contains("using straight line distance"));
        assert!(prompt.contains("candidate places along the route:\n[]"));
    }

    #[test]
    fn parses_model_json_and_skips_bad_places() {
        let raw = r#"{
            "fastestRoute": {"distanceKm": 1, "time": "0h 1m", "polyline": [[0, 0], [1, 1]]},
            "scenicRoute": {
                "recommendedPlaces": [
                    {"name": "National Museum", "coordinates": [47.93, 107.2],
                     "description": "Artifacts", "matchReason": "museums"},
                    {"name": "Nowhere", "coordinates": [200, 500]},
                    {"name": "No coords"}
                ],
                "polyline": []
            },
            "explanation": "Visit the museum."
        }"#;
        let plan = parse_model_output(raw);
        assert!(!plan.degraded);
        assert_eq!(plan.recommended_places.len(), 1);
        assert_eq!(plan.recommended_places[0].match_reason, "museums");
        assert_eq!(plan.explanation.as_deref(), Some("Visit the museum."));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"explanation\": \"Fenced\"}\n```";
        let plan = parse_model_output(raw);
        assert!(!plan.degraded);
        assert_eq!(plan.explanation.as_deref(), Some("Fenced"));
        assert!(plan.recommended_places.is_empty());
    }

    #[test]
    fn non_json_output_degrades_to_explanation() {
        let raw = "Sorry, I can only describe the trip in prose.";
        let plan = parse_model_output(raw);
        assert!(plan.degraded);
        assert_eq!(plan.explanation.as_deref(), Some(raw));
        assert!(plan.recommended_places.is_empty());

        assert!(parse_model_output("[1, 2, 3]").degraded);
    }

    #[test]
    fn malformed_scenic_route_keeps_explanation() {
        let plan = parse_model_output(
            r#"{"scenicRoute": {"recommendedPlaces": null, "polyline": []},
                "explanation": "Drive east and enjoy the steppe."}"#,
        );
        assert!(!plan.degraded);
        assert!(plan.recommended_places.is_empty());
        assert_eq!(plan.explanation.as_deref(), Some("Drive east and enjoy the steppe."));

        let plan = parse_model_output(r#"{"scenicRoute": 5, "explanation": "Short trip."}"#);
        assert!(!plan.degraded);
        assert_eq!(plan.explanation.as_deref(), Some("Short trip."));

        let plan = parse_model_output(
            r#"{"scenicRoute": "see the lakes", "explanation": "Lakes."}"#,
        );
        assert!(!plan.degraded);
        assert!(plan.recommended_places.is_empty());
        assert_eq!(plan.explanation.as_deref(), Some("Lakes."));

        let plan = parse_model_output(r#"{"scenicRoute": {"recommendedPlaces": {"name": "x"}}}"#);
        assert!(!plan.degraded);
        assert!(plan.recommended_places.is_empty());
        assert_eq!(plan.explanation, None);
    }

    #[test]
    fn reconcile_overrides_model_geometry() {
        let route = road_route();
        let model = parse_model_output(
            r#"{"fastestRoute": {"distanceKm": 1.0, "time": "9h 9m", "polyline": [[1, 1], [2, 2]]},
                "scenicRoute": {"recommendedPlaces": [], "polyline": [[3, 3]]},
                "explanation": "ok"}"#,
        );
        let plan = reconcile(model, &route);

        assert_eq!(plan.fastest_route.polyline, route.coordinates);
        assert_eq!(plan.scenic_route.polyline, route.coordinates);
        assert_eq!(plan.fastest_route.distance_km, 82.4);
        assert_eq!(plan.fastest_route.time, "2h 5m");
        assert_eq!(plan.explanation.as_deref(), Some("ok"));
    }

    #[test]
    fn reconcile_fills_routes_for_degraded_output() {
        let route = road_route();
        let plan = reconcile(parse_model_output("not json"), &route);
        assert_eq!(plan.fastest_route.polyline, route.coordinates);
        assert_eq!(plan.scenic_route.polyline, route.coordinates);
        assert_eq!(plan.explanation.as_deref(), Some("not json"));
    }
}
