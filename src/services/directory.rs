use std::sync::Arc;
use thiserror::Error;

use crate::core::{GeoError, ProximityFilter, ProximityResult};
use crate::models::{Address, AddressDraft, AddressRequest, ProximityQuery};
use crate::services::geocoding::{GeocodeError, GeocodeQuery, GeocodedLocation, GeocodingService};
use crate::services::repository::{AddressRepository, RepositoryError};

/// Errors surfaced by directory operations
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Radius {requested} km exceeds the maximum of {max} km")]
    RadiusTooLarge { requested: f64, max: f64 },
}

/// Outcome of a nearby-addresses lookup
#[derive(Debug)]
pub struct NearestResult {
    pub origin: GeocodedLocation,
    pub radius_km: f64,
    pub result: ProximityResult<Address>,
}

/// Address directory: geocoding, persistence and proximity search
///
/// Every write resolves the textual address first, so a record never
/// reaches the repository without a coordinate.
pub struct AddressDirectory {
    geocoder: Arc<dyn GeocodingService>,
    repository: Arc<dyn AddressRepository>,
    filter: ProximityFilter,
    default_radius_km: f64,
    max_radius_km: f64,
}

impl AddressDirectory {
    pub fn new(
        geocoder: Arc<dyn GeocodingService>,
        repository: Arc<dyn AddressRepository>,
        filter: ProximityFilter,
        default_radius_km: f64,
        max_radius_km: f64,
    ) -> Self {
        Self {
            geocoder,
            repository,
            filter,
            default_radius_km,
            max_radius_km,
        }
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    async fn resolve_draft(&self, request: AddressRequest) -> Result<AddressDraft, DirectoryError> {
        let location = self.geocoder.resolve(&request.geocode_query()).await?;

        Ok(AddressDraft {
            name: request.name,
            address_line: request.address_line,
            city: request.city,
            state: request.state,
            country: location.admin_area,
            postal_code: request.postal_code,
            map_url: location.map_url,
            coordinate: location.coordinate,
        })
    }

    /// Geocode and store a new address
    pub async fn create(&self, request: AddressRequest) -> Result<Address, DirectoryError> {
        let draft = self.resolve_draft(request).await?;
        let address = self.repository.create(draft).await?;

        tracing::info!("Created address {} at {}", address.id, address.coordinate);
        Ok(address)
    }

    pub async fn list_all(&self) -> Result<Vec<Address>, DirectoryError> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Address, DirectoryError> {
        Ok(self.repository.get(id).await?)
    }

    /// Replace an address wholesale, re-resolving its coordinate
    pub async fn update(&self, id: i64, request: AddressRequest) -> Result<Address, DirectoryError> {
        // Unknown ids fail before spending a geocoder call
        self.repository.get(id).await?;

        let draft = self.resolve_draft(request).await?;
        let address = self.repository.update(id, draft).await?;

        tracing::info!("Updated address {} to {}", address.id, address.coordinate);
        Ok(address)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DirectoryError> {
        self.repository.delete(id).await?;
        tracing::info!("Deleted address {}", id);
        Ok(())
    }

    /// Addresses within `radius_km` of the resolved query address
    ///
    /// Falls back to the configured default radius when none is given.
    pub async fn nearest(&self, query: &GeocodeQuery, radius_km: Option<f64>) -> Result<NearestResult, DirectoryError> {
        let radius_km = radius_km.unwrap_or(self.default_radius_km);
        if radius_km > self.max_radius_km {
            return Err(DirectoryError::RadiusTooLarge {
                requested: radius_km,
                max: self.max_radius_km,
            });
        }

        let origin = self.geocoder.resolve(query).await?;
        let candidates = self.repository.list_all().await?;

        let result = self.filter.find(
            ProximityQuery {
                origin: origin.coordinate,
                radius_km,
            },
            candidates,
        )?;

        tracing::info!(
            "Found {} addresses within {} km of {} (from {} candidates, {} skipped)",
            result.matches.len(),
            radius_km,
            origin.coordinate,
            result.total_candidates,
            result.skipped
        );

        Ok(NearestResult {
            origin,
            radius_km,
            result,
        })
    }

    pub async fn health_check(&self) -> bool {
        match self.repository.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Repository health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConvergencePolicy;
    use crate::models::Coordinate;
    use crate::services::memory::InMemoryAddressRepository;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Resolves by city name from a fixed table
    struct CityGeocoder {
        cities: HashMap<&'static str, Coordinate>,
    }

    #[async_trait]
    impl GeocodingService for CityGeocoder {
        async fn resolve(&self, query: &GeocodeQuery) -> Result<GeocodedLocation, GeocodeError> {
            let coordinate = self
                .cities
                .get(query.city.as_str())
                .copied()
                .ok_or_else(|| GeocodeError::NotFound(query.location()))?;

            Ok(GeocodedLocation {
                coordinate,
                admin_area: "FR".to_string(),
                map_url: format!("https://maps.example/{}", query.city),
            })
        }
    }

    fn directory(policy: ConvergencePolicy) -> AddressDirectory {
        let cities = HashMap::from([
            ("Paris", Coordinate { latitude: 48.8566, longitude: 2.3522 }),
            ("Versailles", Coordinate { latitude: 48.8049, longitude: 2.1204 }),
            ("Lyon", Coordinate { latitude: 45.7640, longitude: 4.8357 }),
            ("Antipode", Coordinate { latitude: -48.8566, longitude: -177.6478 }),
        ]);

        AddressDirectory::new(
            Arc::new(CityGeocoder { cities }),
            Arc::new(InMemoryAddressRepository::new()),
            ProximityFilter::new(policy, 1024),
            100.0,
            1000.0,
        )
    }

    fn request(name: &str, city: &str) -> AddressRequest {
        AddressRequest {
            name: name.to_string(),
            address_line: "1 Rue Example".to_string(),
            city: city.to_string(),
            state: "IDF".to_string(),
            postal_code: "75001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_fills_geocoded_fields() {
        let dir = directory(ConvergencePolicy::Fail);

        let address = dir.create(request("Office", "Paris")).await.unwrap();

        assert_eq!(address.country, "FR");
        assert_eq!(address.map_url, "https://maps.example/Paris");
        assert_eq!(address.coordinate.latitude, 48.8566);
    }

    #[tokio::test]
    async fn test_unresolvable_address_not_stored() {
        let dir = directory(ConvergencePolicy::Fail);

        let err = dir.create(request("Ghost", "Atlantis")).await.unwrap_err();

        assert!(matches!(err, DirectoryError::Geocode(GeocodeError::NotFound(_))));
        assert!(dir.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_regeocodes() {
        let dir = directory(ConvergencePolicy::Fail);
        let created = dir.create(request("Office", "Paris")).await.unwrap();

        let updated = dir.update(created.id, request("Office", "Lyon")).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.coordinate.latitude, 45.7640);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let dir = directory(ConvergencePolicy::Fail);
        let err = dir.update(42, request("x", "Paris")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Repository(RepositoryError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_nearest_uses_default_radius() {
        let dir = directory(ConvergencePolicy::Fail);
        dir.create(request("Palace", "Versailles")).await.unwrap();
        dir.create(request("Station", "Lyon")).await.unwrap();

        let nearest = dir
            .nearest(&GeocodeQuery::new("", "1 Rue Example", "Paris", "IDF"), None)
            .await
            .unwrap();

        assert_eq!(nearest.radius_km, 100.0);
        assert_eq!(nearest.result.total_candidates, 2);
        let names: Vec<&str> = nearest.result.matches.iter().map(|m| m.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["Palace"]);
    }

    #[tokio::test]
    async fn test_nearest_rejects_oversized_radius() {
        let dir = directory(ConvergencePolicy::Fail);
        let err = dir
            .nearest(&GeocodeQuery::new("", "1 Rue Example", "Paris", "IDF"), Some(5000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::RadiusTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_nearest_convergence_policy() {
        let failing = directory(ConvergencePolicy::Fail);
        failing.create(request("Far", "Antipode")).await.unwrap();
        let err = failing
            .nearest(&GeocodeQuery::new("", "1 Rue Example", "Paris", "IDF"), Some(500.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Geo(GeoError::Convergence { .. })));

        let skipping = directory(ConvergencePolicy::Skip);
        skipping.create(request("Far", "Antipode")).await.unwrap();
        skipping.create(request("Palace", "Versailles")).await.unwrap();
        let nearest = skipping
            .nearest(&GeocodeQuery::new("", "1 Rue Example", "Paris", "IDF"), Some(500.0))
            .await
            .unwrap();
        assert_eq!(nearest.result.skipped, 1);
        assert_eq!(nearest.result.matches.len(), 1);
    }
}
