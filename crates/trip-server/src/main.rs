//! Trip Server - route enrichment and itinerary synthesis backend

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trip_core::places::PlaceIndex;
use trip_server::api;
use trip_server::config::Config;
use trip_server::llm::OpenAiCompatClient;
use trip_server::routing::OsrmClient;
use trip_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("trip_server=debug".parse()?))
        .init();

    tracing::info!("Starting Trip Server...");

    let config = Config::from_env();
    let port = config.server_port;

    // Loaded once; handlers share the read-only index.
    let places = Arc::new(PlaceIndex::load_or_empty(
        &config.places_path,
        config.places_coord_order,
    ));
    let routing = Arc::new(OsrmClient::from_config(&config)?);
    let generator = Arc::new(OpenAiCompatClient::from_config(&config)?);
    let state = Arc::new(AppState::new(config, places, routing, generator));
    tracing::info!(
        places = state.places().len(),
        osrm = %state.config().osrm_url,
        model = %state.config().llm_model,
        "State ready"
    );

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
