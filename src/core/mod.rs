// Core algorithm exports
pub mod debounce;
pub mod distance;
pub mod engine;
pub mod filters;
pub mod neighbors;

pub use debounce::{QueryDebouncer, DEFAULT_QUERY_DEBOUNCE};
pub use distance::{great_circle_km, haversine_distance, round_to_tenth};
pub use engine::SearchEngine;
pub use filters::{is_same_country_neighbor, is_within_radius, matches_username};
pub use neighbors::{derive_view, find_neighbors, find_user};
