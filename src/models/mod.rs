// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CityMatch, KeywordBlend, LabelMatch, MatchPolicy, MatchResult, PhotoPayload, ScoreBreakdown,
    ScoringWeights, SimilarityFallback, Venue, VenueSummary, VENUE_ID_LEN,
};
pub use requests::FindVenuesRequest;
pub use responses::{ErrorResponse, FindVenuesResponse, HealthResponse, VenueListResponse};
