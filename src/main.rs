use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use venue_match::config::{LoggingSettings, Settings};
use venue_match::core::{EmbeddingSimilarity, Matcher, SemanticSimilarity, VenueRepository};
use venue_match::models::ScoringWeights;
use venue_match::routes::{self, matches::AppState};
use venue_match::services::{EmbeddingCache, HttpEmbedder, PostgresClient};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Initialize logging; LOG_LEVEL / LOG_FORMAT override the config file
fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting Venue Match service...");

    // Initialize embedding cache (Redis L2 is optional)
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(3600);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = match settings.cache.redis_url.as_deref() {
        Some(redis_url) => match EmbeddingCache::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(cache) => {
                info!("Embedding cache initialized (L1: {} entries, L2: redis, TTL: {}s)", l1_cache_size, cache_ttl);
                cache
            }
            Err(e) => {
                error!("Failed to connect to Redis ({}), caching embeddings in-process only", e);
                EmbeddingCache::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("Embedding cache initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
            EmbeddingCache::in_memory(l1_cache_size, cache_ttl)
        }
    };

    // Initialize embedding provider
    let embedder = HttpEmbedder::new(
        &settings.embedding.endpoint,
        &settings.embedding.path,
        settings.embedding.api_key.clone(),
        settings.embedding.model.clone(),
        settings.embedding.dimensions,
        settings.embedding.timeout(),
    )
    .map_err(|e| {
        error!("Failed to create embedding client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let similarity: Arc<dyn SemanticSimilarity> =
        Arc::new(EmbeddingSimilarity::new(embedder, Arc::new(cache)));

    info!("Embedding provider initialized (model: {})", settings.embedding.model);

    // Initialize PostgreSQL client
    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let repository: Arc<dyn VenueRepository> = Arc::new(postgres);

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    // Initialize matcher with configured weights and policies
    let weights = ScoringWeights::from(&settings.scoring.weights);
    let policy = settings.matching.policy();

    let matcher = Matcher::new(repository.clone(), similarity, weights)
        .with_policy(policy)
        .with_concurrency(settings.matching.concurrency)
        .with_timeout(settings.matching.timeout());

    info!("Matcher initialized with weights: {:?}, policy: {:?}", weights, policy);

    // Build application state
    let app_state = AppState { repository, matcher };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
