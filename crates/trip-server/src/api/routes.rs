//! REST API routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use trip_core::conversation::{advance, ChatRequest, ChatResponse, StageOutcome};

use crate::api::request_id::{ensure_request_id, RequestId};
use crate::state::AppState;

/// Shown to the user whenever plan generation fails.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(|| async { "OK" }))
        .layer(middleware::from_fn(ensure_request_id))
}

/// One conversation turn. Protocol outcomes, including requests for missing
/// input, are answered with 200.
async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected chat request: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ChatResponse::message(rejection.body_text())),
            );
        }
    };

    tracing::debug!(
        %request_id,
        stage = request.stage.as_deref().unwrap_or("-"),
        history = request.messages.len(),
        "Chat turn"
    );

    match advance(request.stage.as_deref(), &request.user_inputs) {
        StageOutcome::Reply {
            message,
            next_stage,
        } => (StatusCode::OK, Json(ChatResponse::reply(message, next_stage))),
        StageOutcome::Plan(trip) => match state.synthesizer().synthesize(&trip).await {
            Ok(plan) => {
                tracing::info!(
                    %request_id,
                    recommended = plan.scenic_route.recommended_places.len(),
                    "Trip plan ready"
                );
                (StatusCode::OK, Json(ChatResponse::from_plan(plan)))
            }
            Err(err) => {
                tracing::error!(%request_id, "Trip plan failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ChatResponse::message(GENERIC_ERROR_MESSAGE)),
                )
            }
        },
    }
}
