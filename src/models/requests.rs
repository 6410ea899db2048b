use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::geocoding::GeocodeQuery;

/// Body of create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    #[serde(alias = "address_line")]
    pub address_line: String,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(length(min = 1, max = 120))]
    pub state: String,
    #[validate(length(max = 20))]
    #[serde(default, alias = "postal_code")]
    pub postal_code: String,
}

impl AddressRequest {
    /// Strip leading and trailing whitespace from every field
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address_line: self.address_line.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
        }
    }

    pub fn geocode_query(&self) -> GeocodeQuery {
        GeocodeQuery::new(&self.name, &self.address_line, &self.city, &self.state)
    }
}

/// Query string of the nearest-addresses endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearestQuery {
    #[serde(default)]
    pub name: String,
    #[validate(length(min = 1))]
    #[serde(alias = "address_line")]
    pub address_line: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[serde(default, alias = "radius_km")]
    pub radius_km: Option<f64>,
}

impl NearestQuery {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address_line: self.address_line.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            radius_km: self.radius_km,
        }
    }

    pub fn geocode_query(&self) -> GeocodeQuery {
        GeocodeQuery::new(&self.name, &self.address_line, &self.city, &self.state)
    }
}

/// Form body of the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_then_validated() {
        let request = AddressRequest {
            name: "  Home ".to_string(),
            address_line: " 10 Downing St".to_string(),
            city: "London  ".to_string(),
            state: "   ".to_string(),
            postal_code: " SW1A 2AA ".to_string(),
        }
        .trimmed();

        assert_eq!(request.name, "Home");
        assert_eq!(request.postal_code, "SW1A 2AA");
        // whitespace-only state is empty after trimming
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_nearest_query_accepts_camel_case() {
        let query: NearestQuery = serde_json::from_value(serde_json::json!({
            "name": "x",
            "addressLine": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "radiusKm": 25.0
        }))
        .unwrap();

        assert_eq!(query.radius_km, Some(25.0));
        assert!(query.validate().is_ok());
    }
}
