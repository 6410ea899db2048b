// Core algorithm exports
pub mod distance;
pub mod error;
pub mod proximity;

pub use distance::{distance, great_circle_distance};
pub use error::GeoError;
pub use proximity::{filter_within_radius, ConvergencePolicy, Located, Nearby, ProximityFilter, ProximityResult};
