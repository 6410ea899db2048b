use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::GeoError;

/// Geographic coordinate in degrees on the WGS-84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coordinate = Self { latitude, longitude };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check the latitude/longitude range invariant
    ///
    /// Needed for values that arrive through deserialization or the
    /// database rather than through [`Coordinate::new`].
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::Validation(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::Validation(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(value: Coordinate) -> Self {
        geo::Point::new(value.longitude, value.latitude)
    }
}

/// A directory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub name: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub map_url: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Address {
    /// Build a record from a draft, as a repository does on insert
    pub fn from_draft(id: i64, draft: AddressDraft, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            address_line: draft.address_line,
            city: draft.city,
            state: draft.state,
            country: draft.country,
            postal_code: draft.postal_code,
            map_url: draft.map_url,
            coordinate: draft.coordinate,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every user-facing field, keeping identity and creation time
    pub fn replace_with(&mut self, draft: AddressDraft, now: chrono::DateTime<chrono::Utc>) {
        self.name = draft.name;
        self.address_line = draft.address_line;
        self.city = draft.city;
        self.state = draft.state;
        self.country = draft.country;
        self.postal_code = draft.postal_code;
        self.map_url = draft.map_url;
        self.coordinate = draft.coordinate;
        self.updated_at = now;
    }
}

/// Fully resolved address fields without identity
///
/// Only built after the geocoder has produced a coordinate, so a draft
/// handed to a repository always carries a valid location.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressDraft {
    pub name: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub map_url: String,
    pub coordinate: Coordinate,
}

/// Query point plus search radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityQuery {
    pub origin: Coordinate,
    pub radius_km: f64,
}

/// Authenticated user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}
