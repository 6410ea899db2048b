use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinate;

/// Errors that can occur while resolving an address
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geocoding provider error: {0}")]
    Provider(String),

    #[error("Address could not be resolved: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Textual address to resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeocodeQuery {
    pub name: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
}

impl GeocodeQuery {
    pub fn new(name: &str, address_line: &str, city: &str, state: &str) -> Self {
        Self {
            name: name.to_string(),
            address_line: address_line.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        }
    }

    /// Single-line location string sent to the provider
    ///
    /// The record name is not part of the postal address, so it is left out.
    pub fn location(&self) -> String {
        [&self.address_line, &self.city, &self.state]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case and whitespace insensitive form, used as a cache key
    pub fn normalized(&self) -> Self {
        let norm = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        Self {
            name: norm(&self.name),
            address_line: norm(&self.address_line),
            city: norm(&self.city),
            state: norm(&self.state),
        }
    }
}

/// A resolved address
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    pub coordinate: Coordinate,
    /// Country-level administrative area
    pub admin_area: String,
    pub map_url: String,
}

/// Resolves free-text addresses to coordinates
#[async_trait]
pub trait GeocodingService: Send + Sync {
    async fn resolve(&self, query: &GeocodeQuery) -> Result<GeocodedLocation, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    info: MapQuestInfo,
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestInfo {
    statuscode: i64,
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
struct MapQuestLocation {
    #[serde(rename = "latLng")]
    lat_lng: MapQuestLatLng,
    #[serde(rename = "adminArea1", default)]
    admin_area1: String,
    #[serde(rename = "mapUrl", default)]
    map_url: String,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

/// MapQuest geocoding API client
pub struct MapQuestGeocoder {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl MapQuestGeocoder {
    /// Create a new MapQuest client
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }

    fn request_url(&self, query: &GeocodeQuery) -> String {
        format!(
            "{}?key={}&location={}&maxResults=1",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&query.location())
        )
    }
}

#[async_trait]
impl GeocodingService for MapQuestGeocoder {
    async fn resolve(&self, query: &GeocodeQuery) -> Result<GeocodedLocation, GeocodeError> {
        let location = query.location();
        if location.is_empty() {
            return Err(GeocodeError::NotFound("empty address".to_string()));
        }

        tracing::debug!("Geocoding '{}' for '{}'", location, query.name);

        let response = self.client.get(self.request_url(query)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Geocoding request for '{}' failed: {} - {}", location, status, body);
            return Err(GeocodeError::Provider(format!("HTTP {}", status)));
        }

        let body: MapQuestResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        if body.info.statuscode != 0 {
            return Err(GeocodeError::Provider(format!(
                "status {}: {}",
                body.info.statuscode,
                body.info.messages.join("; ")
            )));
        }

        let found = body
            .results
            .into_iter()
            .next()
            .and_then(|result| result.locations.into_iter().next())
            .ok_or_else(|| GeocodeError::NotFound(location.clone()))?;

        let coordinate = Coordinate::new(found.lat_lng.lat, found.lat_lng.lng)
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Resolved '{}' to {}", location, coordinate);

        Ok(GeocodedLocation {
            coordinate,
            admin_area: found.admin_area1,
            map_url: found.map_url,
        })
    }
}
