use rayon::prelude::*;
use serde::Deserialize;

use crate::core::distance::{distance, great_circle_distance};
use crate::core::error::GeoError;
use crate::models::{Address, Coordinate, ProximityQuery};

/// Candidate sets at least this large are measured on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

/// Anything that sits at a single coordinate
pub trait Located {
    fn coordinate(&self) -> Coordinate;
}

impl Located for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

impl Located for Address {
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn coordinate(&self) -> Coordinate {
        (**self).coordinate()
    }
}

/// What to do with a candidate whose distance does not converge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergencePolicy {
    /// Abort the whole query with the convergence error
    #[default]
    Fail,
    /// Leave the candidate out and count it as skipped
    Skip,
    /// Measure the candidate with the spherical approximation instead
    GreatCircle,
}

/// A candidate that passed the radius check
#[derive(Debug, Clone, PartialEq)]
pub struct Nearby<T> {
    pub candidate: T,
    pub distance_km: f64,
}

/// Result of a proximity scan
#[derive(Debug)]
pub struct ProximityResult<T> {
    pub matches: Vec<Nearby<T>>,
    pub total_candidates: usize,
    pub skipped: usize,
}

impl<T> ProximityResult<T> {
    fn empty(total_candidates: usize) -> Self {
        Self {
            matches: Vec::new(),
            total_candidates,
            skipped: 0,
        }
    }

    /// Drop the distances, keeping the candidates in order
    pub fn into_candidates(self) -> Vec<T> {
        self.matches.into_iter().map(|m| m.candidate).collect()
    }
}

/// Radius filter over a full scan of the candidates
///
/// Output keeps the input order and any duplicates. The scan is linear in
/// the number of candidates; there is no spatial index.
#[derive(Debug, Clone, Copy)]
pub struct ProximityFilter {
    policy: ConvergencePolicy,
    parallel_threshold: usize,
}

impl ProximityFilter {
    pub fn new(policy: ConvergencePolicy, parallel_threshold: usize) -> Self {
        Self {
            policy,
            parallel_threshold: parallel_threshold.max(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ConvergencePolicy::default(), DEFAULT_PARALLEL_THRESHOLD)
    }

    pub fn policy(&self) -> ConvergencePolicy {
        self.policy
    }

    /// Candidates within `query.radius_km` of `query.origin`
    pub fn find<T>(&self, query: ProximityQuery, candidates: Vec<T>) -> Result<ProximityResult<T>, GeoError>
    where
        T: Located + Sync,
    {
        self.find_within_radius(query.origin, query.radius_km, candidates)
    }

    /// Candidates whose geodesic distance to `origin` is at most `radius_km`
    ///
    /// # Errors
    /// * [`GeoError::Validation`] for a non-finite radius or an invalid
    ///   origin or candidate coordinate
    /// * [`GeoError::Convergence`] for a non-converging candidate when the
    ///   policy is [`ConvergencePolicy::Fail`]
    pub fn find_within_radius<T>(
        &self,
        origin: Coordinate,
        radius_km: f64,
        candidates: Vec<T>,
    ) -> Result<ProximityResult<T>, GeoError>
    where
        T: Located + Sync,
    {
        origin.validate()?;
        if !radius_km.is_finite() {
            return Err(GeoError::Validation(format!("radius {} is not finite", radius_km)));
        }

        let total_candidates = candidates.len();
        if radius_km < 0.0 || candidates.is_empty() {
            return Ok(ProximityResult::empty(total_candidates));
        }

        // Measured in parallel for large sets; collect keeps input order
        let measured: Vec<Result<Option<f64>, GeoError>> = if total_candidates >= self.parallel_threshold {
            candidates
                .par_iter()
                .map(|candidate| self.measure(origin, candidate.coordinate()))
                .collect()
        } else {
            candidates
                .iter()
                .map(|candidate| self.measure(origin, candidate.coordinate()))
                .collect()
        };

        // First failure in input order wins
        let distances = measured.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut result = ProximityResult::empty(total_candidates);
        for (candidate, distance_km) in candidates.into_iter().zip(distances) {
            match distance_km {
                Some(distance_km) if distance_km <= radius_km => {
                    result.matches.push(Nearby { candidate, distance_km });
                }
                Some(_) => {}
                None => result.skipped += 1,
            }
        }

        Ok(result)
    }

    /// Distance to one candidate; `None` when the policy skips it
    fn measure(&self, origin: Coordinate, target: Coordinate) -> Result<Option<f64>, GeoError> {
        target.validate()?;

        match distance(origin, target) {
            Ok(km) => Ok(Some(km)),
            Err(err) if err.is_convergence() => match self.policy {
                ConvergencePolicy::Fail => Err(err),
                ConvergencePolicy::Skip => {
                    tracing::warn!("Skipping candidate at {}: {}", target, err);
                    Ok(None)
                }
                ConvergencePolicy::GreatCircle => {
                    tracing::debug!("Falling back to great-circle distance for {}", target);
                    Ok(Some(great_circle_distance(origin, target)))
                }
            },
            Err(err) => Err(err),
        }
    }
}

impl Default for ProximityFilter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Candidates within `radius_km` of `origin`, in input order
///
/// Fail-fast form: a non-converging candidate aborts the scan.
pub fn filter_within_radius<T>(origin: Coordinate, radius_km: f64, candidates: Vec<T>) -> Result<Vec<T>, GeoError>
where
    T: Located + Sync,
{
    ProximityFilter::with_defaults()
        .find_within_radius(origin, radius_km, candidates)
        .map(ProximityResult::into_candidates)
}
