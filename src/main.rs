use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use volunteer_match::config::Settings;
use volunteer_match::routes::{self, AppState};
use volunteer_match::services::{
    CachedGeocoder, DocumentCollections, DocumentStoreClient, GeocodeCache, Geocoder, GoogleGeocoder,
};

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging.level, &settings.logging.format);

    info!("Starting volunteer match service...");

    // Geocoder behind the two-tier cache
    let google = GoogleGeocoder::new(
        settings.geocoder.endpoint.clone(),
        settings.geocoder.api_key.clone(),
        Duration::from_secs(settings.geocoder.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to build geocoder client", e))?;

    if settings.geocoder.api_key.is_empty() {
        warn!("No geocoder API key configured, lookups will fail and locations stay unresolved");
    }

    let cache_ttl = settings.cache.ttl_secs;
    let cache_capacity = settings.cache.capacity;

    let cache = match settings.cache.redis_url.as_deref() {
        Some(redis_url) => match GeocodeCache::with_redis(redis_url, cache_capacity, cache_ttl).await {
            Ok(cache) => {
                info!("Geocode cache initialized with Redis (L1: {} entries, TTL: {}s)", cache_capacity, cache_ttl);
                cache
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-memory geocode cache only", e);
                GeocodeCache::in_memory(cache_capacity, cache_ttl)
            }
        },
        None => {
            info!("Geocode cache initialized in memory (L1: {} entries, TTL: {}s)", cache_capacity, cache_ttl);
            GeocodeCache::in_memory(cache_capacity, cache_ttl)
        }
    };

    let cache = Arc::new(cache);
    let geocoder: Arc<dyn Geocoder> = Arc::new(CachedGeocoder::new(google, cache.clone()));

    // Document store for profiles and postings
    let collections = DocumentCollections {
        profiles: settings.documents.profiles_collection.clone(),
        postings: settings.documents.postings_collection.clone(),
    };

    let documents = Arc::new(
        DocumentStoreClient::new(
            settings.documents.endpoint.clone(),
            settings.documents.api_key.clone(),
            settings.documents.project_id.clone(),
            settings.documents.database_id.clone(),
            collections,
        )
        .map_err(|e| startup_error("Failed to build document store client", e))?,
    );

    info!("Document store client initialized");

    let policy = settings.scoring.policy();
    if !policy.weights.is_valid() {
        return Err(startup_error("Invalid scoring weights", format!("{:?}", policy.weights)));
    }

    info!("Scoring with preset {} and weights {:?}", policy.preset, policy.weights);

    let app_state = AppState::new(
        geocoder,
        documents.clone(),
        documents,
        policy,
        settings.geocoder.max_concurrency,
    )
    .with_geocode_cache(cache);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::query_config())
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
