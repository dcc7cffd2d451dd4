use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::core::repository::{RepositoryError, VenueRepository};
use crate::models::{PhotoPayload, Venue};

/// Content type assumed for stored photos without one
const DEFAULT_PHOTO_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

impl From<PostgresError> for RepositoryError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::SqlxError(sqlx::Error::ColumnDecode { index, source }) => {
                RepositoryError::InvalidRecord(format!("column {}: {}", index, source))
            }
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

/// PostgreSQL-backed venue catalog
///
/// Holds a long-lived connection pool; callers never open or close
/// connections themselves.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn all_venues(&self) -> Result<Vec<Venue>, PostgresError> {
        let query = r#"
            SELECT id, name, city, zipcode, phone, email, capacity, style, keywords, inquiry_url
            FROM venues
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let venues = rows
            .iter()
            .map(venue_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} venues", venues.len());

        Ok(venues)
    }

    async fn photos_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Option<PhotoPayload>>, PostgresError> {
        let query = r#"
            SELECT id, photo, photo_content_type, photo_url
            FROM venues
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(query).bind(ids).fetch_all(&self.pool).await?;

        let mut photos = HashMap::with_capacity(ids.len());
        for row in &rows {
            let id: String = row.try_get("id")?;
            photos.insert(id, photo_from_row(row)?);
        }

        // Requested ids that no longer exist map to no photo
        for id in ids {
            photos.entry(id.clone()).or_insert(None);
        }

        Ok(photos)
    }

    async fn venue_by_id(&self, id: &str) -> Result<Option<Venue>, PostgresError> {
        let query = r#"
            SELECT id, name, city, zipcode, phone, email, capacity, style, keywords, inquiry_url,
                   photo, photo_content_type, photo_url
            FROM venues
            WHERE id = $1
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;

        row.map(|row| {
            let mut venue = venue_from_row(&row)?;
            venue.photo = photo_from_row(&row)?;
            Ok::<_, PostgresError>(venue)
        })
        .transpose()
    }
}

#[async_trait]
impl VenueRepository for PostgresClient {
    async fn fetch_all_venues(&self) -> Result<Vec<Venue>, RepositoryError> {
        Ok(self.all_venues().await?)
    }

    async fn fetch_photos_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Option<PhotoPayload>>, RepositoryError> {
        Ok(self.photos_by_ids(ids).await?)
    }

    async fn get_venue(&self, id: &str) -> Result<Option<Venue>, RepositoryError> {
        Ok(self.venue_by_id(id).await?)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| PostgresError::from(e).into())
    }
}

fn venue_from_row(row: &PgRow) -> Result<Venue, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let capacity = venue_capacity(&id, row.try_get("capacity")?);

    Ok(Venue {
        id,
        name: row.try_get("name")?,
        city: row.try_get("city")?,
        zipcode: row.try_get("zipcode")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        capacity,
        style: row.try_get("style")?,
        keywords: row.try_get("keywords")?,
        inquiry_url: row.try_get("inquiry_url")?,
        photo: None,
    })
}

/// Stored capacity outside `u32` is treated as absent and logged
fn venue_capacity(id: &str, raw: Option<i64>) -> Option<u32> {
    let raw = raw?;
    match u32::try_from(raw) {
        Ok(capacity) => Some(capacity),
        Err(_) => {
            tracing::warn!("Venue {} has out-of-range capacity {}; treating as absent", id, raw);
            None
        }
    }
}

fn photo_from_row(row: &PgRow) -> Result<Option<PhotoPayload>, sqlx::Error> {
    let data: Option<Vec<u8>> = row.try_get("photo")?;
    let content_type: Option<String> = row.try_get("photo_content_type")?;
    let url: Option<String> = row.try_get("photo_url")?;

    Ok(photo_payload(data, content_type, url))
}

/// Inline bytes win over a URL reference
fn photo_payload(
    data: Option<Vec<u8>>,
    content_type: Option<String>,
    url: Option<String>,
) -> Option<PhotoPayload> {
    match (data, url) {
        (Some(data), _) if !data.is_empty() => Some(PhotoPayload::Inline {
            content_type: content_type.unwrap_or_else(|| DEFAULT_PHOTO_CONTENT_TYPE.to_string()),
            data,
        }),
        (_, Some(url)) if !url.trim().is_empty() => Some(PhotoPayload::Url { url }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_payload_prefers_inline() {
        let photo = photo_payload(
            Some(vec![0xff, 0xd8]),
            Some("image/jpeg".to_string()),
            Some("https://cdn/venue.jpg".to_string()),
        );
        assert_eq!(
            photo,
            Some(PhotoPayload::Inline { content_type: "image/jpeg".to_string(), data: vec![0xff, 0xd8] })
        );
    }

    #[test]
    fn test_photo_payload_url_and_absent() {
        assert_eq!(
            photo_payload(None, None, Some("https://cdn/v.jpg".to_string())),
            Some(PhotoPayload::Url { url: "https://cdn/v.jpg".to_string() })
        );
        assert_eq!(photo_payload(Some(vec![]), None, Some(" ".to_string())), None);
        assert_eq!(photo_payload(None, None, None), None);
    }

    #[test]
    fn test_venue_capacity_range() {
        assert_eq!(venue_capacity("V00000000001", Some(250)), Some(250));
        assert_eq!(venue_capacity("V00000000001", Some(i64::from(u32::MAX))), Some(u32::MAX));
        assert_eq!(venue_capacity("V00000000001", Some(i64::from(u32::MAX) + 1)), None);
        assert_eq!(venue_capacity("V00000000001", Some(-5)), None);
        assert_eq!(venue_capacity("V00000000001", None), None);
    }

    #[test]
    fn test_unavailable_error_mapping() {
        let err: RepositoryError = PostgresError::SqlxError(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_fetch_all_venues() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let client = PostgresClient::from_settings(&url, Some(2), Some(1), None, None)
            .await
            .expect("Failed to connect");

        assert!(client.health_check().await.unwrap());
        let venues = client.fetch_all_venues().await.unwrap();
        assert!(venues.iter().all(|v| v.photo.is_none()));
    }
}
