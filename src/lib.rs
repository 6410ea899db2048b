//! Address Directory - geocoded address book with geodesic proximity search
//!
//! Addresses are resolved to WGS-84 coordinates when they are stored. The
//! core computes ellipsoidal distances (Vincenty) and filters stored
//! addresses by radius around a query address.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{distance, filter_within_radius, ConvergencePolicy, GeoError, Located, ProximityFilter};
pub use models::{Address, AddressDraft, AddressRequest, Coordinate, ProximityQuery};
