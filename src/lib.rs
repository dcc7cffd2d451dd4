//! Venue Match - matching and ranking service for event venues
//!
//! This library turns partially-specified venue criteria (city, capacity,
//! style, keywords) into one bounded score per catalog venue and returns the
//! top 15, with photos attached only to the survivors.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Criteria, MatchError, MatchOutcome, Matcher, SemanticSimilarity, VenueRepository, TOP_K};
pub use crate::models::{FindVenuesRequest, FindVenuesResponse, MatchPolicy, MatchResult, ScoringWeights, Venue};
