//! Caching layer for directions answers.
//!
//! Road distances between fixed points barely change, and every provider
//! call costs budget. Answers are cached per (origin, destination, profile)
//! with coordinates rounded to 1e-5 degrees (about a metre), so the same
//! question from different requests hits the cache. Failures are not cached.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::directions::{DirectionsError, DirectionsPort, Profile, RouteEstimate};
use crate::domain::Coordinates;

/// Coordinate rounding used in cache keys (1e-5 degrees).
const KEY_SCALE: f64 = 1e5;

/// Cache key: rounded (origin lat, origin lng, destination lat, destination lng), profile.
type RouteKey = (i64, i64, i64, i64, Profile);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(6 * 60 * 60),
            max_capacity: 10_000,
        }
    }
}

fn round(v: f64) -> i64 {
    (v * KEY_SCALE).round() as i64
}

fn route_key(origin: Coordinates, destination: Coordinates, profile: Profile) -> RouteKey {
    (
        round(origin.lat()),
        round(origin.lng()),
        round(destination.lat()),
        round(destination.lng()),
        profile,
    )
}

/// Directions provider with caching.
///
/// Cache hits never reach the wrapped provider, so they consume no budget.
pub struct CachedDirections<P> {
    inner: P,
    routes: MokaCache<RouteKey, RouteEstimate>,
}

impl<P: DirectionsPort> CachedDirections<P> {
    /// Wrap a provider.
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, routes }
    }

    /// Access the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.routes.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.routes.invalidate_all();
    }
}

impl<P: DirectionsPort> DirectionsPort for CachedDirections<P> {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        let key = route_key(origin, destination, profile);

        if let Some(cached) = self.routes.get(&key).await {
            debug!(%origin, %destination, %profile, "Directions cache hit");
            return Ok(cached);
        }

        let estimate = self.inner.route(origin, destination, profile).await?;
        self.routes.insert(key, estimate.clone()).await;

        Ok(estimate)
    }
}
