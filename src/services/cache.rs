use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Multi-tier cache for embedding vectors
///
/// L1 is an in-process moka cache; L2 is an optional Redis instance shared
/// across replicas. Only vectors are cached, never scores. Lookups are
/// best-effort: a Redis failure is logged and treated as a miss.
pub struct EmbeddingCache {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Arc<Vec<f32>>>,
    ttl_secs: u64,
}

impl EmbeddingCache {
    /// Create a cache backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// Create an L1-only cache
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    /// Get a vector (L1 first, then L2)
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<f32>>> {
        if let Some(vector) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Some(vector);
        }

        let redis = self.redis.as_ref()?;
        match Self::get_l2(redis, key).await {
            Ok(Some(vector)) => {
                tracing::trace!("L2 cache hit: {}", key);
                let vector = Arc::new(vector);
                self.l1_cache.insert(key.to_string(), vector.clone()).await;
                Some(vector)
            }
            Ok(None) => {
                tracing::trace!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("L2 cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Store a vector in both tiers
    pub async fn set(&self, key: &str, vector: Arc<Vec<f32>>) {
        if let Some(redis) = &self.redis {
            if let Err(e) = self.set_l2(redis, key, &vector).await {
                tracing::warn!("L2 cache write failed for {}: {}", key, e);
            }
        }

        self.l1_cache.insert(key.to_string(), vector).await;
        tracing::trace!("Cache set: {}", key);
    }

    async fn get_l2(
        redis: &tokio::sync::Mutex<ConnectionManager>,
        key: &str,
    ) -> Result<Option<Vec<f32>>, CacheError> {
        let mut conn = redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_l2(
        &self,
        redis: &tokio::sync::Mutex<ConnectionManager>,
        key: &str,
        vector: &[f32],
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(vector)?;

        let mut conn = redis.lock().await;
        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<()>(&mut *conn)
            .await?;

        Ok(())
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Arc<Vec<f32>>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a text embedding
    pub fn embedding(model: &str, text: &str) -> String {
        format!("emb:{}:{}", model, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get_redis() {
        let cache = EmbeddingCache::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = CacheKey::embedding("test", "wedding");
        cache.set(&key, Arc::new(vec![0.5, 0.25])).await;

        let fresh = EmbeddingCache::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");
        assert_eq!(fresh.get(&key).await.as_deref(), Some(&vec![0.5, 0.25]));
    }

    #[tokio::test]
    async fn test_in_memory_set_get() {
        let cache = EmbeddingCache::in_memory(100, 60);
        let key = CacheKey::embedding("m", "outdoor");

        assert!(cache.get(&key).await.is_none());
        cache.set(&key, Arc::new(vec![1.0, 2.0])).await;
        assert_eq!(cache.get(&key).await.as_deref(), Some(&vec![1.0, 2.0]));
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::embedding("minilm", "jazz,rock"), "emb:minilm:jazz,rock");
    }
}
