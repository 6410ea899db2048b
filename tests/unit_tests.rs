// Unit tests for the geodesic core

use address_directory::core::{
    distance::{distance, great_circle_distance},
    proximity::{filter_within_radius, ConvergencePolicy, ProximityFilter},
    GeoError,
};
use address_directory::models::Coordinate;

fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
}

fn sample_points() -> Vec<Coordinate> {
    vec![
        coord(0.0, 0.0),
        coord(40.7128, -74.0060),
        coord(34.0522, -118.2437),
        coord(51.5007, -0.1246),
        coord(48.8566, 2.3522),
        coord(-33.8688, 151.2093),
        coord(35.6762, 139.6503),
        coord(-54.8019, -68.3030),
        coord(89.9, 45.0),
        coord(-90.0, 0.0),
    ]
}

#[test]
fn test_distance_to_self_is_zero() {
    for p in sample_points() {
        assert_eq!(distance(p, p).unwrap(), 0.0, "distance({}, {})", p, p);
    }
}

#[test]
fn test_distance_symmetric_and_non_negative() {
    let points = sample_points();
    for a in &points {
        for b in &points {
            let ab = distance(*a, *b).unwrap();
            let ba = distance(*b, *a).unwrap();
            assert!(ab >= 0.0);
            assert!((ab - ba).abs() < 1e-6, "{} -> {}: {} vs {}", a, b, ab, ba);
        }
    }
}

#[test]
fn test_one_degree_longitude_at_equator() {
    let d = distance(coord(0.0, 0.0), coord(0.0, 1.0)).unwrap();
    assert!((d - 111.19).abs() <= 111.19 * 0.005, "got {}", d);
}

#[test]
fn test_london_paris_reference() {
    let d = distance(coord(51.5007, -0.1246), coord(48.8566, 2.3522)).unwrap();
    assert!((d - 343.5).abs() <= 343.5 * 0.01, "got {}", d);
}

#[test]
fn test_spherical_and_ellipsoidal_agree_within_half_percent() {
    let points = sample_points();
    for a in &points {
        for b in &points {
            if a == b {
                continue;
            }
            let ellipsoidal = distance(*a, *b).unwrap();
            let spherical = great_circle_distance(*a, *b);
            assert!(
                (ellipsoidal - spherical).abs() / ellipsoidal < 0.006,
                "{} -> {}: {} vs {}",
                a,
                b,
                ellipsoidal,
                spherical
            );
        }
    }
}

#[test]
fn test_near_antipodal_is_convergence_error() {
    match distance(coord(0.0, 0.0), coord(0.5, 179.7)) {
        Err(GeoError::Convergence { iterations, .. }) => assert_eq!(iterations, 200),
        other => panic!("expected convergence error, got {:?}", other),
    }
}

#[test]
fn test_filter_scenario_10_99_150_km() {
    let query = coord(0.0, 0.0);
    let candidates = vec![
        ("ten", coord(0.09, 0.0)),
        ("ninety-nine", coord(0.89, 0.0)),
        ("one-fifty", coord(1.36, 0.0)),
    ];

    let kept = filter_within_radius(query, 100.0, candidates.iter().map(|(_, c)| *c).collect()).unwrap();

    assert_eq!(kept, vec![candidates[0].1, candidates[1].1]);
}

#[test]
fn test_filter_is_exact_partition() {
    let query = coord(48.8566, 2.3522);
    let candidates = sample_points();

    let kept = filter_within_radius(query, 1000.0, candidates.clone()).unwrap();

    for c in &candidates {
        let within = distance(query, *c).unwrap() <= 1000.0;
        assert_eq!(kept.contains(c), within, "{}", c);
    }
}

#[test]
fn test_filter_preserves_relative_order() {
    let query = coord(0.0, 0.0);
    // shuffled distances: 50, 10, 90, 30 km east
    let candidates = vec![coord(0.0, 0.449), coord(0.0, 0.0898), coord(0.0, 0.8085), coord(0.0, 0.2695)];

    let kept = filter_within_radius(query, 60.0, candidates.clone()).unwrap();

    assert_eq!(kept, vec![candidates[0], candidates[1], candidates[3]]);
}

#[test]
fn test_filter_zero_radius_and_empty() {
    let query = coord(10.0, 10.0);
    assert!(filter_within_radius::<Coordinate>(query, 25.0, vec![]).unwrap().is_empty());

    let kept = filter_within_radius(query, 0.0, vec![coord(10.0, 10.0001), coord(10.0, 10.0)]).unwrap();
    assert_eq!(kept, vec![coord(10.0, 10.0)]);
}

#[test]
fn test_filter_policies_on_antipodal_candidate() {
    let query = coord(0.0, 0.0);
    let candidates = vec![coord(0.0, 0.1), coord(0.5, 179.7)];

    let fail = ProximityFilter::new(ConvergencePolicy::Fail, 16).find_within_radius(query, 30_000.0, candidates.clone());
    assert!(matches!(fail, Err(GeoError::Convergence { .. })));

    let skip = ProximityFilter::new(ConvergencePolicy::Skip, 16)
        .find_within_radius(query, 30_000.0, candidates.clone())
        .unwrap();
    assert_eq!(skip.matches.len(), 1);
    assert_eq!(skip.skipped, 1);

    let fallback = ProximityFilter::new(ConvergencePolicy::GreatCircle, 16)
        .find_within_radius(query, 30_000.0, candidates)
        .unwrap();
    assert_eq!(fallback.matches.len(), 2);
}
