use actix_web::{web, HttpResponse, Responder};

use crate::models::{ErrorResponse, VenueListResponse, VENUE_ID_LEN};
use crate::routes::matches::{match_error_response, AppState};

/// Configure venue lookup routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/venues", web::get().to(list_venues))
        .route("/venues/{venue_id}", web::get().to(get_venue));
}

/// List all venues, unscored
///
/// GET /api/v1/venues
async fn list_venues(state: web::Data<AppState>) -> impl Responder {
    match state.matcher.list_all().await {
        Ok(venues) => HttpResponse::Ok().json(VenueListResponse {
            count: venues.len(),
            venues,
        }),
        Err(e) => {
            tracing::error!("Failed to list venues: {}", e);
            match_error_response(&e)
        }
    }
}

/// Get a single venue with its photo
///
/// GET /api/v1/venues/{venue_id}
async fn get_venue(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let venue_id = path.into_inner();

    if venue_id.chars().count() != VENUE_ID_LEN {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid venue id".to_string(),
            message: format!("Venue id must be {} characters", VENUE_ID_LEN),
            status_code: 400,
        });
    }

    match state.repository.get_venue(&venue_id).await {
        Ok(Some(venue)) => HttpResponse::Ok().json(venue),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Venue not found".to_string(),
            message: format!("No venue with id {}", venue_id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch venue {}: {}", venue_id, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Venue catalog unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Matcher, RepositoryError, SemanticSimilarity, SimilarityError, VenueRepository};
    use crate::models::{PhotoPayload, ScoringWeights, Venue};
    use crate::routes::configure_routes;
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct Catalog(Vec<Venue>);

    #[async_trait]
    impl VenueRepository for Catalog {
        async fn fetch_all_venues(&self) -> Result<Vec<Venue>, RepositoryError> {
            Ok(self.0.iter().cloned().map(|mut v| { v.photo = None; v }).collect())
        }

        async fn fetch_photos_by_ids(
            &self,
            ids: &[String],
        ) -> Result<HashMap<String, Option<PhotoPayload>>, RepositoryError> {
            Ok(ids.iter().map(|id| (id.clone(), None)).collect())
        }

        async fn get_venue(&self, id: &str) -> Result<Option<Venue>, RepositoryError> {
            Ok(self.0.iter().find(|v| v.id == id).cloned())
        }
    }

    struct Neutral;

    #[async_trait]
    impl SemanticSimilarity for Neutral {
        async fn similarity(&self, _lhs: &str, _rhs: &str) -> Result<f32, SimilarityError> {
            Ok(0.0)
        }
    }

    fn app_state() -> AppState {
        let venue = Venue {
            id: "venue0000001".to_string(),
            name: "Loft".to_string(),
            city: Some("Queens".to_string()),
            zipcode: None,
            phone: Some(7185550100),
            email: Some("events@loft.example".to_string()),
            capacity: Some(80),
            style: Some("industrial".to_string()),
            keywords: None,
            inquiry_url: None,
            photo: Some(PhotoPayload::Url { url: "https://cdn.example/loft.jpg".to_string() }),
        };
        let repository: Arc<dyn VenueRepository> = Arc::new(Catalog(vec![venue]));
        AppState {
            matcher: Matcher::new(repository.clone(), Arc::new(Neutral), ScoringWeights::default()),
            repository,
        }
    }

    #[actix_web::test]
    async fn test_list_venues() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(app_state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/venues").to_request();
        let resp: VenueListResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.count, 1);
        assert_eq!(resp.venues[0].name, "Loft");
    }

    #[actix_web::test]
    async fn test_get_venue_includes_photo() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(app_state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/venues/venue0000001").to_request();
        let venue: Venue = test::call_and_read_body_json(&app, req).await;

        assert!(matches!(venue.photo, Some(PhotoPayload::Url { .. })));
    }

    #[actix_web::test]
    async fn test_get_venue_errors() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(app_state())).configure(configure_routes),
        )
        .await;

        let missing = test::TestRequest::get().uri("/api/v1/venues/venue9999999").to_request();
        assert_eq!(test::call_service(&app, missing).await.status(), StatusCode::NOT_FOUND);

        let malformed = test::TestRequest::get().uri("/api/v1/venues/short").to_request();
        assert_eq!(test::call_service(&app, malformed).await.status(), StatusCode::BAD_REQUEST);
    }
}
