//! Shared library surface for the trip server and its tests.

pub mod api;
pub mod config;
pub mod llm;
pub mod routing;
pub mod state;
pub mod synthesizer;
