use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{PhotoPayload, Venue};

/// Errors surfaced by a venue repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid venue record: {0}")]
    InvalidRecord(String),
}

/// Read access to the venue catalog
///
/// Implementations own their connection lifecycle; the matcher only holds a
/// shared reference.
#[async_trait]
pub trait VenueRepository: Send + Sync {
    /// All venues in a stable order, without photo payloads
    async fn fetch_all_venues(&self) -> Result<Vec<Venue>, RepositoryError>;

    /// Photos for the given ids; ids without a photo map to `None`
    async fn fetch_photos_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Option<PhotoPayload>>, RepositoryError>;

    /// Single venue including its photo
    async fn get_venue(&self, id: &str) -> Result<Option<Venue>, RepositoryError>;

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Ok(true)
    }
}
