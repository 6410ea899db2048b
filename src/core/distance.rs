use geo::HaversineDistance;

use crate::core::error::GeoError;
use crate::models::Coordinate;

/// WGS-84 equatorial radius in kilometers
pub const WGS84_SEMI_MAJOR_KM: f64 = 6378.137;

/// WGS-84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;

/// WGS-84 polar radius in kilometers
pub const WGS84_SEMI_MINOR_KM: f64 = (1.0 - WGS84_FLATTENING) * WGS84_SEMI_MAJOR_KM;

/// Stop iterating once lambda moves less than this (radians)
pub const CONVERGENCE_TOLERANCE: f64 = 1e-12;

/// Iteration cap before reporting non-convergence
pub const MAX_ITERATIONS: usize = 200;

/// Angular state on the auxiliary sphere once lambda has converged
struct AuxiliaryArc {
    sigma: f64,
    sin_sigma: f64,
    cos_sigma: f64,
    cos_sq_alpha: f64,
    cos_2sigma_m: f64,
}

/// Geodesic distance between two points on the WGS-84 ellipsoid, in kilometers
///
/// Uses Vincenty's inverse formula. Both coordinates are expected to be
/// valid already; range checks happen at the boundary.
///
/// # Errors
/// [`GeoError::Convergence`] when lambda does not settle within
/// [`MAX_ITERATIONS`], which happens for nearly antipodal points.
pub fn distance(from: Coordinate, to: Coordinate) -> Result<f64, GeoError> {
    if from == to {
        return Ok(0.0);
    }

    let f = WGS84_FLATTENING;
    let a = WGS84_SEMI_MAJOR_KM;
    let b = WGS84_SEMI_MINOR_KM;

    let l = (to.longitude - from.longitude).to_radians();
    let u1 = ((1.0 - f) * from.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut arc = None;

    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();

        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        // Coincident points
        if sin_sigma == 0.0 {
            return Ok(0.0);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;

        // Equatorial line: cos_sq_alpha is zero
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };

        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < CONVERGENCE_TOLERANCE {
            arc = Some(AuxiliaryArc {
                sigma,
                sin_sigma,
                cos_sigma,
                cos_sq_alpha,
                cos_2sigma_m,
            });
            break;
        }
    }

    let arc = arc.ok_or(GeoError::Convergence {
        from,
        to,
        iterations: MAX_ITERATIONS,
    })?;

    let u_sq = arc.cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let cos_2sigma_m = arc.cos_2sigma_m;
    let delta_sigma = big_b
        * arc.sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (arc.cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * arc.sin_sigma * arc.sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    Ok((b * big_a * (arc.sigma - delta_sigma)).max(0.0))
}

/// Spherical (haversine) distance in kilometers
///
/// Always defined, but up to ~0.5% off the ellipsoidal value. Only used
/// when a caller explicitly opts into it for non-converging pairs.
pub fn great_circle_distance(from: Coordinate, to: Coordinate) -> f64 {
    let from: geo::Point<f64> = from.into();
    let to: geo::Point<f64> = to.into();
    from.haversine_distance(&to) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate { latitude, longitude }
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = coord(40.7128, -74.0060);
        assert_eq!(distance(p, p).unwrap(), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = distance(coord(0.0, 0.0), coord(0.0, 1.0)).unwrap();
        // 111.319 km on the ellipsoid
        assert!((d - 111.19).abs() / 111.19 < 0.005, "got {}", d);
    }

    #[test]
    fn test_london_to_paris() {
        let d = distance(coord(51.5007, -0.1246), coord(48.8566, 2.3522)).unwrap();
        assert!((d - 343.5).abs() / 343.5 < 0.01, "Distance should be ~343.5km, got {}", d);
    }

    #[test]
    fn test_pole_to_pole() {
        let d = distance(coord(90.0, 0.0), coord(-90.0, 0.0)).unwrap();
        assert!((d - 20003.93).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_same_pole_different_longitude() {
        let d = distance(coord(90.0, 0.0), coord(90.0, 50.0)).unwrap();
        assert!(d >= 0.0 && d < 1e-6, "got {}", d);
    }

    #[test]
    fn test_symmetry() {
        let a = coord(40.7128, -74.0060);
        let b = coord(34.0522, -118.2437);
        let ab = distance(a, b).unwrap();
        let ba = distance(b, a).unwrap();
        assert!((ab - ba).abs() < 1e-9);
        assert!((ab - 3944.42).abs() < 0.1, "got {}", ab);
    }

    #[test]
    fn test_near_antipodal_fails_to_converge() {
        let err = distance(coord(0.0, 0.0), coord(0.5, 179.7)).unwrap_err();
        assert!(err.is_convergence());
    }

    #[test]
    fn test_equatorial_antipodes_fail_to_converge() {
        assert!(distance(coord(0.0, 0.0), coord(0.0, 180.0)).is_err());
    }

    #[test]
    fn test_great_circle_close_to_ellipsoidal() {
        let a = coord(51.5007, -0.1246);
        let b = coord(48.8566, 2.3522);
        let spherical = great_circle_distance(a, b);
        let ellipsoidal = distance(a, b).unwrap();
        assert!((spherical - ellipsoidal).abs() / ellipsoidal < 0.005);
    }

    #[test]
    fn test_great_circle_defined_at_antipodes() {
        let d = great_circle_distance(coord(0.0, 0.0), coord(0.5, 179.7));
        assert!(d > 19_000.0 && d < 20_100.0, "got {}", d);
    }
}
