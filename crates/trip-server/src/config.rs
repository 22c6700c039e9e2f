//! Server configuration from environment.

use std::env;
use std::str::FromStr;

use trip_core::places::CoordinateOrder;
use trip_core::proximity::DEFAULT_RADIUS_KM;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub osrm_url: String,
    pub route_timeout_s: u64,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_s: u64,
    pub places_path: String,
    pub places_coord_order: CoordinateOrder,
    pub search_radius_km: f64,
    pub max_candidates: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            osrm_url: "http://router.project-osrm.org".to_string(),
            route_timeout_s: 10,
            llm_api_key: String::new(),
            llm_base_url: "https://openrouter.ai/api/v1".to_string(),
            llm_model: "deepseek/deepseek-r1:free".to_string(),
            llm_timeout_s: 60,
            places_path: "Archeology_all_data.json".to_string(),
            places_coord_order: CoordinateOrder::Swapped,
            search_radius_km: DEFAULT_RADIUS_KM,
            max_candidates: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed_var("TRIP_PORT").unwrap_or(defaults.server_port),
            osrm_url: env::var("OSRM_URL").unwrap_or(defaults.osrm_url),
            route_timeout_s: parsed_var("ROUTE_TIMEOUT_S").unwrap_or(defaults.route_timeout_s),
            llm_api_key: env::var("OPENROUTER_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .unwrap_or(defaults.llm_api_key),
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_model: env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout_s: parsed_var("LLM_TIMEOUT_S").unwrap_or(defaults.llm_timeout_s),
            places_path: env::var("PLACES_PATH").unwrap_or(defaults.places_path),
            places_coord_order: parsed_var("PLACES_COORD_ORDER")
                .unwrap_or(defaults.places_coord_order),
            search_radius_km: parsed_var::<f64>("SEARCH_RADIUS_KM")
                .filter(|r| r.is_finite() && *r >= 0.0)
                .unwrap_or(defaults.search_radius_km),
            max_candidates: parsed_var("MAX_CANDIDATES").unwrap_or(defaults.max_candidates),
        }
    }
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, raw);
            None
        }
    }
}
