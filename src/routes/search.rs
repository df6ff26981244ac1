use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::derive_view;
use crate::models::{
    AcceptedResponse, ErrorResponse, HealthResponse, LookupRequest, QueryChangedRequest,
    RadiusChangedRequest, SearchState,
};
use crate::services::{LoadState, SessionHandle};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
}

/// Configure all search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/search", web::get().to(current_view))
        .route("/search/query", web::put().to(change_query))
        .route("/search/radius", web::put().to(change_radius))
        .route("/search/lookup", web::post().to(lookup))
        .route("/dataset/reload", web::post().to(reload_dataset));
}

fn unavailable(state: &LoadState) -> HttpResponse {
    let message = match state {
        LoadState::Failed { reason } => format!("Dataset failed to load: {}", reason),
        _ => "Dataset is still loading".to_string(),
    };

    HttpResponse::ServiceUnavailable().json(ErrorResponse {
        error: "Dataset unavailable".to_string(),
        message,
        status_code: 503,
    })
}

fn session_stopped(e: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("Search session unavailable: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Search session unavailable".to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let load = state.session.load_state();
    let records = state.session.snapshot().map(|d| d.len()).unwrap_or(0);

    let status = match load {
        LoadState::Loaded { .. } => "healthy",
        _ => "degraded",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        dataset: load.label().to_string(),
        records,
    })
}

/// Current view of the session
///
/// GET /api/v1/search
async fn current_view(state: web::Data<AppState>) -> impl Responder {
    match state.session.view() {
        Some(view) => HttpResponse::Ok().json(view.as_ref()),
        None => unavailable(&state.session.load_state()),
    }
}

/// Query input endpoint
///
/// PUT /api/v1/search/query
///
/// Request body:
/// ```json
/// { "query": "string" }
/// ```
async fn change_query(
    state: web::Data<AppState>,
    req: web::Json<QueryChangedRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let QueryChangedRequest { query } = req.into_inner();
    tracing::debug!("Query input: {:?}", query);

    match state.session.query(query) {
        Ok(()) => HttpResponse::Accepted().json(AcceptedResponse {
            accepted: true,
            input: "query".to_string(),
        }),
        Err(e) => session_stopped(e),
    }
}

/// Radius input endpoint
///
/// PUT /api/v1/search/radius
///
/// Request body:
/// ```json
/// { "radiusKm": 500 }
/// ```
async fn change_radius(
    state: web::Data<AppState>,
    req: web::Json<RadiusChangedRequest>,
) -> impl Responder {
    match state.session.radius(req.radius_km) {
        Ok(()) => HttpResponse::Accepted().json(AcceptedResponse {
            accepted: true,
            input: "radius".to_string(),
        }),
        Err(e) => session_stopped(e),
    }
}

/// One-shot lookup endpoint
///
/// POST /api/v1/search/lookup
///
/// Evaluates the query against the current dataset without touching the
/// session inputs.
///
/// Request body:
/// ```json
/// { "query": "string", "radiusKm": 500 }
/// ```
async fn lookup(
    state: web::Data<AppState>,
    req: web::Json<LookupRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let Some(dataset) = state.session.snapshot() else {
        return unavailable(&state.session.load_state());
    };

    let radius_km = req.radius_km.or(Some(state.session.default_radius_km()));
    let search = SearchState::new(&req.query, radius_km);
    let view = derive_view(dataset.records(), &search);

    tracing::info!(
        "Lookup '{}' within {} km: {} neighbors",
        search.query,
        search.radius.km(),
        view.neighbors.len()
    );

    HttpResponse::Ok().json(view)
}

/// Dataset reload endpoint
///
/// POST /api/v1/dataset/reload
async fn reload_dataset(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Dataset reload requested");

    match state.session.reload() {
        Ok(()) => HttpResponse::Accepted().json(AcceptedResponse {
            accepted: true,
            input: "reload".to_string(),
        }),
        Err(e) => session_stopped(e),
    }
}
