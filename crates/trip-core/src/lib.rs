pub mod conversation;
pub mod models;
pub mod places;
pub mod plan;
pub mod proximity;
pub mod spatial;

pub use conversation::{
    advance, parse_trip_details, ChatMessage, ChatRequest, ChatResponse, ConversationState,
    StageOutcome, TripRequest, UserInputs,
};
pub use models::{
    CandidatePlace, Coordinate, CoordinateError, FastestRoute, PlaceRecord, RecommendedPlace,
    RouteResult, ScenicRoute, TripPlan,
};
pub use places::{CoordinateOrder, PlaceIndex, PlaceIndexError};
pub use plan::{build_prompt, format_duration, parse_model_output, reconcile, ModelPlan};
pub use proximity::{filter_near, preference_keywords, DEFAULT_RADIUS_KM};
pub use spatial::{haversine_distance, haversine_km, point_to_polyline_km, straight_line_route};
