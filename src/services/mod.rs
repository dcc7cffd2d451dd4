// Service exports
pub mod cache;
pub mod embedding;
pub mod postgres;

pub use cache::{CacheError, CacheKey, EmbeddingCache};
pub use embedding::HttpEmbedder;
pub use postgres::{PostgresClient, PostgresError};
