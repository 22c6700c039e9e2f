//! API routes for the trip server.

pub mod request_id;
mod routes;

use axum::Router;

pub use routes::GENERIC_ERROR_MESSAGE;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}
