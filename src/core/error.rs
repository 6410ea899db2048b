use thiserror::Error;

use crate::models::Coordinate;

/// Errors raised by the geodesic core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Geodesic iteration did not converge between {from} and {to} after {iterations} iterations")]
    Convergence {
        from: Coordinate,
        to: Coordinate,
        iterations: usize,
    },
}

impl GeoError {
    pub fn is_convergence(&self) -> bool {
        matches!(self, GeoError::Convergence { .. })
    }
}
