//! Trip SDK - client library for the trip planning server
//!
//! The server is stateless; [`TripClient`] keeps the conversation stage,
//! collected inputs and message history and sends them on every turn.

pub mod client;

pub use client::TripClient;
pub use trip_core::conversation::{ChatResponse, ConversationState, UserInputs};
pub use trip_core::models::Coordinate;
