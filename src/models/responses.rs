use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchResult, VenueSummary};

/// Response for find venues endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindVenuesResponse {
    pub request_id: String,
    pub matches: Vec<MatchResult>,
    pub total_candidates: usize,
    /// Non-fatal problems with the submitted criteria
    pub warnings: Vec<String>,
}

/// Response for venue listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueListResponse {
    pub venues: Vec<VenueSummary>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
