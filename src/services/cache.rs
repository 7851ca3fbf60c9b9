use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::services::geocoder::{GeocodeError, Geocoder, Resolution};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Two-tier cache of geocoding outcomes, keyed by normalized location text
///
/// L1 is in-process with a TTL. L2 (Redis) is optional and shared across
/// instances; its failures are logged and treated as misses.
pub struct GeocodeCache {
    l1_cache: moka::future::Cache<String, Resolution>,
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    ttl_secs: u64,
}

impl GeocodeCache {
    /// Create an in-process cache only
    pub fn in_memory(capacity: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            l1_cache,
            redis: None,
            ttl_secs,
        }
    }

    /// Create a cache backed by Redis as the second tier
    pub async fn with_redis(redis_url: &str, capacity: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let mut cache = Self::in_memory(capacity, ttl_secs);
        cache.redis = Some(Arc::new(tokio::sync::Mutex::new(redis)));
        Ok(cache)
    }

    /// Get a cached outcome (L1 first, then L2)
    pub async fn get(&self, location_text: &str) -> Option<Resolution> {
        let key = CacheKey::geocode(location_text);

        if let Some(resolution) = self.l1_cache.get(&key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Some(resolution);
        }

        let redis = self.redis.as_ref()?;
        match Self::redis_get(redis, &key).await {
            Ok(Some(resolution)) => {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key, resolution.clone()).await;
                Some(resolution)
            }
            Ok(None) => {
                tracing::trace!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Redis lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Store an outcome in both tiers
    pub async fn insert(&self, location_text: &str, resolution: &Resolution) {
        let key = CacheKey::geocode(location_text);
        self.l1_cache.insert(key.clone(), resolution.clone()).await;

        if let Some(redis) = &self.redis {
            if let Err(e) = Self::redis_set(redis, &key, resolution, self.ttl_secs).await {
                tracing::warn!("Redis write failed for {}: {}", key, e);
            }
        }

        tracing::trace!("Cache set: {}", key);
    }

    /// Drop every in-process entry
    pub fn invalidate_all(&self) {
        self.l1_cache.invalidate_all();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            shared_tier: self.redis.is_some(),
            ttl_secs: self.ttl_secs,
        }
    }

    async fn redis_get(
        redis: &tokio::sync::Mutex<ConnectionManager>,
        key: &str,
    ) -> Result<Option<Resolution>, CacheError> {
        let mut conn = redis.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        drop(conn);

        Ok(value.map(|json| serde_json::from_str(&json)).transpose()?)
    }

    async fn redis_set(
        redis: &tokio::sync::Mutex<ConnectionManager>,
        key: &str,
        resolution: &Resolution,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(resolution)?;

        let mut conn = redis.lock().await;
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(json)
            .query_async(&mut *conn)
            .await?;

        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub shared_tier: bool,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a location string: trimmed, lowercased, whitespace collapsed
    pub fn geocode(location_text: &str) -> String {
        let normalized = location_text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        format!("geocode:{}", normalized)
    }
}

/// Geocoder decorator that consults a `GeocodeCache` before the wrapped geocoder
///
/// Only answers from the service are cached, including "not found". Transport
/// and payload failures are not, so the next request retries them.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Arc<GeocodeCache>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: Arc<GeocodeCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn lookup(&self, location_text: &str) -> Result<Resolution, GeocodeError> {
        if let Some(resolution) = self.cache.get(location_text).await {
            return Ok(resolution);
        }

        let resolution = self.inner.lookup(location_text).await?;
        self.cache.insert(location_text, &resolution).await;
        Ok(resolution)
    }
}
