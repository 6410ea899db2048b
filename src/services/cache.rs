use async_trait::async_trait;
use std::time::Duration;

use crate::services::geocoding::{GeocodeError, GeocodeQuery, GeocodedLocation, GeocodingService};

/// In-memory cache in front of a geocoder
///
/// Repeated lookups of the same address (same text up to case and spacing)
/// are answered from memory until the TTL expires. Failures are never cached.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: moka::future::Cache<GeocodeQuery, GeocodedLocation>,
}

impl<G: GeocodingService> CachedGeocoder<G> {
    pub fn new(inner: G, max_entries: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, cache }
    }

    /// Number of cached resolutions
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drop every cached resolution
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl<G: GeocodingService> GeocodingService for CachedGeocoder<G> {
    async fn resolve(&self, query: &GeocodeQuery) -> Result<GeocodedLocation, GeocodeError> {
        let key = query.normalized();

        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!("Geocode cache hit: {}", key.location());
            return Ok(hit);
        }

        let resolved = self.inner.resolve(query).await?;
        self.cache.insert(key, resolved.clone()).await;

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeocodingService for CountingGeocoder {
        async fn resolve(&self, query: &GeocodeQuery) -> Result<GeocodedLocation, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.city == "Nowhere" {
                return Err(GeocodeError::NotFound(query.location()));
            }
            Ok(GeocodedLocation {
                coordinate: Coordinate { latitude: 1.0, longitude: 2.0 },
                admin_area: "US".to_string(),
                map_url: String::new(),
            })
        }
    }

    fn cached() -> CachedGeocoder<CountingGeocoder> {
        CachedGeocoder::new(CountingGeocoder { calls: AtomicUsize::new(0) }, 100, 60)
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_cache() {
        let geocoder = cached();

        let first = geocoder.resolve(&GeocodeQuery::new("a", "1 Main St", "Springfield", "IL")).await.unwrap();
        let second = geocoder.resolve(&GeocodeQuery::new("A", "1 main st", "SPRINGFIELD", "il")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let geocoder = cached();
        let query = GeocodeQuery::new("a", "1 Main St", "Nowhere", "IL");

        assert!(geocoder.resolve(&query).await.is_err());
        assert!(geocoder.resolve(&query).await.is_err());

        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_lookup() {
        let geocoder = cached();
        let query = GeocodeQuery::new("a", "1 Main St", "Springfield", "IL");

        geocoder.resolve(&query).await.unwrap();
        geocoder.invalidate_all();
        geocoder.resolve(&query).await.unwrap();

        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 2);
    }
}
