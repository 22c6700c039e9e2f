//! Shared, read-only application state.

use std::sync::Arc;

use trip_core::places::PlaceIndex;

use crate::config::Config;
use crate::llm::TextGenerator;
use crate::routing::{RouteProvider, RoutingService};
use crate::synthesizer::PlanSynthesizer;

/// Everything a request handler needs. Nothing in here is mutated after
/// startup, and no conversation state lives on the server.
pub struct AppState {
    config: Config,
    places: Arc<PlaceIndex>,
    synthesizer: PlanSynthesizer,
}

impl AppState {
    pub fn new(
        config: Config,
        places: Arc<PlaceIndex>,
        routing: Arc<dyn RoutingService>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let synthesizer =
            PlanSynthesizer::new(RouteProvider::new(routing), places.clone(), generator)
                .with_radius_km(config.search_radius_km)
                .with_max_candidates(config.max_candidates);
        Self {
            config,
            places,
            synthesizer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn places(&self) -> &PlaceIndex {
        &self.places
    }

    pub fn synthesizer(&self) -> &PlanSynthesizer {
        &self.synthesizer
    }
}
