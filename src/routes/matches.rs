use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{Criteria, MatchError, Matcher, VenueRepository};
use crate::models::{ErrorResponse, FindVenuesRequest, FindVenuesResponse, HealthResponse};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn VenueRepository>,
    pub matcher: Matcher,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.repository.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matching venues endpoint
///
/// POST /api/v1/matches/find
///
/// Request body (all fields optional):
/// ```json
/// {
///   "city": "Brooklyn",
///   "capacity": "100+",
///   "style": "rock,pop",
///   "keywords": "wedding,outdoor"
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindVenuesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let request_id = uuid::Uuid::new_v4().to_string();

    let (criteria, warnings) = Criteria::parse(
        req.city.as_deref(),
        req.capacity.as_deref(),
        req.style.as_deref(),
        req.keywords.as_deref(),
    );

    for warning in &warnings {
        tracing::warn!("Request {}: {}", request_id, warning);
    }

    tracing::info!("Request {}: finding venues for {:?}", request_id, criteria);

    let outcome = match state.matcher.compute_matches(&criteria).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Request {}: matching failed: {}", request_id, e);
            return match_error_response(&e);
        }
    };

    tracing::info!(
        "Request {}: returning {} matches (from {} candidates)",
        request_id,
        outcome.matches.len(),
        outcome.total_candidates
    );

    HttpResponse::Ok().json(FindVenuesResponse {
        request_id,
        matches: outcome.matches,
        total_candidates: outcome.total_candidates,
        warnings: warnings.iter().map(ToString::to_string).collect(),
    })
}

/// Map an engine error to its HTTP response
pub(crate) fn match_error_response(err: &MatchError) -> HttpResponse {
    let (mut builder, error, status_code) = match err {
        MatchError::Repository(_) => (HttpResponse::ServiceUnavailable(), "Venue catalog unavailable", 503),
        MatchError::Similarity(_) => (HttpResponse::InternalServerError(), "Similarity provider failed", 500),
        MatchError::Timeout(_) => (HttpResponse::GatewayTimeout(), "Matching timed out", 504),
    };

    builder.json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code,
    })
}
