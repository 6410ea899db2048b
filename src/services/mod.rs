// Service exports
pub mod auth;
pub mod cache;
pub mod directory;
pub mod geocoding;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use auth::{hash_password, AuthError, AuthService, CredentialStore, InMemoryCredentialStore, UserRecord};
pub use cache::CachedGeocoder;
pub use directory::{AddressDirectory, DirectoryError, NearestResult};
pub use geocoding::{GeocodeError, GeocodeQuery, GeocodedLocation, GeocodingService, MapQuestGeocoder};
pub use memory::InMemoryAddressRepository;
pub use postgres::PostgresAddressRepository;
pub use repository::{AddressRepository, RepositoryError};
