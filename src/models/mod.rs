// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Dataset, Neighbor, NormalizedQuery, Radius, ResultView, SearchState, UserRecord};
pub use requests::{LookupRequest, QueryChangedRequest, RadiusChangedRequest};
pub use responses::{AcceptedResponse, ErrorResponse, HealthResponse};
