use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::matcher::DEFAULT_CONCURRENCY;
use crate::models::{
    CityMatch, KeywordBlend, LabelMatch, MatchPolicy, ScoringWeights, SimilarityFallback,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    pub endpoint: String,
    #[serde(default = "default_embedding_path")]
    pub path: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimensions: Option<u32>,
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_embedding_path() -> String { "/v1/embeddings".to_string() }
fn default_embedding_timeout_ms() -> u64 { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// L2 cache; embeddings are only cached in-process when absent
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: Some(3600),
            l1_cache_size: Some(10_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub city_match: CityMatch,
    #[serde(default)]
    pub style_match: LabelMatch,
    #[serde(default)]
    pub keyword_match: LabelMatch,
    #[serde(default)]
    pub keyword_blend: KeywordBlend,
    #[serde(default)]
    pub on_similarity_error: SimilarityFallback,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub timeout_ms: Option<u64>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            city_match: CityMatch::default(),
            style_match: LabelMatch::default(),
            keyword_match: LabelMatch::default(),
            keyword_blend: KeywordBlend::default(),
            on_similarity_error: SimilarityFallback::default(),
            concurrency: default_concurrency(),
            timeout_ms: None,
        }
    }
}

impl MatchingSettings {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            city: self.city_match,
            style: self.style_match,
            keywords: self.keyword_match,
            keyword_blend: self.keyword_blend,
            on_similarity_error: self.on_similarity_error,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn default_concurrency() -> usize { DEFAULT_CONCURRENCY }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_capacity_weight")]
    pub capacity: f64,
    #[serde(default = "default_city_weight")]
    pub city: f64,
    #[serde(default = "default_style_weight")]
    pub style: f64,
    #[serde(default = "default_keywords_weight")]
    pub keywords: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity_weight(),
            city: default_city_weight(),
            style: default_style_weight(),
            keywords: default_keywords_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(w: &WeightsConfig) -> Self {
        Self {
            capacity: w.capacity,
            city: w.city,
            style: w.style,
            keywords: w.keywords,
        }
    }
}

fn default_capacity_weight() -> f64 { 0.3 }
fn default_city_weight() -> f64 { 0.2 }
fn default_style_weight() -> f64 { 0.3 }
fn default_keywords_weight() -> f64 { 0.2 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with VENUE_)
    /// 5. DATABASE_URL, if set
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., VENUE__SERVER__PORT -> server.port
            .add_source(env_source());

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.scoring.weights;
        if [w.capacity, w.city, w.style, w.keywords].iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(ConfigError::Message("scoring weights must be finite and non-negative".into()));
        }
        if ScoringWeights::from(w).total() <= 0.0 {
            return Err(ConfigError::Message("scoring weights must not all be zero".into()));
        }
        if self.matching.concurrency == 0 {
            return Err(ConfigError::Message("matching.concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("VENUE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
