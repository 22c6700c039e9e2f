//! Plan synthesis: route, candidate places, model call, reconciliation.

use std::sync::Arc;

use thiserror::Error;
use trip_core::conversation::TripRequest;
use trip_core::models::{CandidatePlace, CoordinateError, TripPlan};
use trip_core::places::PlaceIndex;
use trip_core::plan::{build_prompt, parse_model_output, reconcile};
use trip_core::proximity::{filter_near, DEFAULT_RADIUS_KM};

use crate::llm::{GenerateError, TextGenerator};
use crate::routing::RouteProvider;

/// Upper bound on places sent to the model.
pub const DEFAULT_MAX_CANDIDATES: usize = 50;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("invalid trip coordinates: {0}")]
    Route(#[from] CoordinateError),
    #[error("plan generation failed: {0}")]
    Generation(#[from] GenerateError),
}

pub struct PlanSynthesizer {
    routes: RouteProvider,
    places: Arc<PlaceIndex>,
    generator: Arc<dyn TextGenerator>,
    radius_km: f64,
    max_candidates: usize,
}

impl PlanSynthesizer {
    pub fn new(
        routes: RouteProvider,
        places: Arc<PlaceIndex>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            routes,
            places,
            generator,
            radius_km: DEFAULT_RADIUS_KM,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Build a trip plan. Route and model calls run in sequence; the
    /// returned geometry is always the computed route.
    pub async fn synthesize(&self, request: &TripRequest) -> Result<TripPlan, SynthesisError> {
        let route = self.routes.get_route(request.start, request.end).await?;

        let nearby = filter_near(
            self.places.all_places(),
            &route.coordinates,
            self.radius_km,
            &request.preferences,
        );
        let candidates: Vec<CandidatePlace<'_>> = nearby
            .iter()
            .take(self.max_candidates)
            .map(|place| CandidatePlace::from(*place))
            .collect();
        tracing::info!(
            days = request.days,
            distance_km = route.distance_km,
            fallback = route.is_fallback,
            nearby = nearby.len(),
            candidates = candidates.len(),
            "Synthesizing trip plan"
        );

        let prompt = build_prompt(request, &route, &candidates);
        let output = self.generator.generate(&prompt).await?;

        let model_plan = parse_model_output(&output);
        if model_plan.degraded {
            tracing::warn!("Returning explanation-only plan from unstructured model output");
        }
        Ok(reconcile(model_plan, &route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RoutingError, RoutingService};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use trip_core::models::{Coordinate, PlaceRecord, RouteResult};

    struct NoRoads;

    #[async_trait]
    impl RoutingService for NoRoads {
        async fn fetch_route(
            &self,
            _start: Coordinate,
            _end: Coordinate,
        ) -> Result<RouteResult, RoutingError> {
            Err(RoutingError::NoRoute("NoRoute".to_string()))
        }
    }

    #[derive(Default)]
    struct Recording {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Recording {
        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct Offline;

    #[async_trait]
    impl TextGenerator for Offline {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Err(GenerateError::EmptyResponse)
        }
    }

    fn places_along_route(count: usize) -> Vec<PlaceRecord> {
        (0..count)
            .map(|i| PlaceRecord {
                id: i as i64,
                name: format!("Site {i}"),
                category: "Museum".to_string(),
                description: "Museum".to_string(),
                coordinates: Coordinate::new(47.92, 107.0 + i as f64 * 0.01),
            })
            .collect()
    }

    fn request(preferences: &str) -> TripRequest {
        TripRequest {
            start: Coordinate::new(47.92, 106.92),
            end: Coordinate::new(47.92, 107.92),
            days: 3,
            preferences: preferences.to_string(),
        }
    }

    fn synthesizer(places: Vec<PlaceRecord>, generator: Arc<dyn TextGenerator>) -> PlanSynthesizer {
        PlanSynthesizer::new(
            RouteProvider::new(Arc::new(NoRoads)),
            Arc::new(PlaceIndex::new(places)),
            generator,
        )
    }

    #[tokio::test]
    async fn candidates_are_truncated_before_prompting() {
        let generator = Arc::new(Recording {
            reply: r#"{"explanation": "done"}"#.to_string(),
            ..Recording::default()
        });
        let plan = synthesizer(places_along_route(60), generator.clone())
            .with_max_candidates(5)
            .synthesize(&request("museum"))
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"name\":\"Site 4\""));
        assert!(!prompts[0].contains("\"name\":\"Site 5\""));
        assert_eq!(plan.explanation.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn fallback_route_geometry_is_returned() {
        let generator = Arc::new(Recording {
            reply: r#"{"fastestRoute": {"polyline": [[0, 0], [1, 1]], "distanceKm": 1}}"#
                .to_string(),
            ..Recording::default()
        });
        let trip = request("");
        let plan = synthesizer(Vec::new(), generator).synthesize(&trip).await.unwrap();

        assert_eq!(plan.fastest_route.polyline, vec![trip.start, trip.end]);
        assert_eq!(plan.scenic_route.polyline, vec![trip.start, trip.end]);
        assert!((plan.fastest_route.distance_km - 74.52).abs() < 0.1);
        assert_eq!(plan.fastest_route.time, "1h 15m");
    }

    #[tokio::test]
    async fn model_failure_is_a_generation_error() {
        let err = synthesizer(places_along_route(3), Arc::new(Offline))
            .synthesize(&request("museum"))
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Generation(_)));
    }

    #[tokio::test]
    async fn invalid_pins_are_a_route_error() {
        let mut trip = request("");
        trip.end = Coordinate::new(95.0, 107.0);
        let err = synthesizer(Vec::new(), Arc::new(Offline))
            .synthesize(&trip)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Route(_)));
    }
}
