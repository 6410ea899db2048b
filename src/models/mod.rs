// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Address, AddressDraft, Coordinate, ProximityQuery, User};
pub use requests::{AddressRequest, LoginForm, NearestQuery};
pub use responses::{ApiResponse, DeletedResponse, ErrorResponse, HealthResponse, NearbyAddress, NearestResponse, TokenResponse};
