//! User Proximity - find a user by username and rank their compatriots by distance
//!
//! This library provides the search engine behind the proximity UI: a
//! Haversine distance calculator, the pure derivation of a result view from
//! (dataset, query, radius), and a debounced session that recomputes the
//! view whenever one of those inputs changes.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    derive_view, great_circle_km, haversine_distance, QueryDebouncer, SearchEngine,
};
pub use models::{Dataset, Neighbor, NormalizedQuery, Radius, ResultView, SearchState, UserRecord};
pub use services::{SearchSession, SessionHandle, SessionOptions, UserSource};
