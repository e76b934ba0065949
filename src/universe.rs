use std::ops::RangeInclusive;

use crate::error::{FuzzyError, Result};
use crate::linspace::Linspace;

// Tolerance for deciding that a step divides a range evenly
const STEP_EPSILON: f64 = 1e-9;

/// The ordered sample points a variable is discretized over.
///
/// Always non-empty, finite and strictly increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct Universe(Vec<f64>);

impl Universe {
    /// Most sample points `with_step` and `linspace` will generate.
    pub const MAX_POINTS: usize = 1 << 20;

    pub fn from_points(points: impl Into<Vec<f64>>) -> Result<Self> {
        let points = points.into();

        if points.is_empty() {
            return Err(FuzzyError::InvalidUniverse("a universe needs at least one point"));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(FuzzyError::InvalidUniverse("universe points must be finite"));
        }
        if points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FuzzyError::InvalidUniverse("universe points must be strictly increasing"));
        }

        Ok(Universe(points))
    }

    /// Samples `min, min + step, ...` up to and including `max` when `step`
    /// divides the range, stopping at the last point below `max` otherwise.
    pub fn with_step(range: RangeInclusive<f64>, step: f64) -> Result<Self> {
        let (min, max) = (*range.start(), *range.end());

        if !(step.is_finite() && step > 0.) {
            return Err(FuzzyError::InvalidUniverse("step must be positive and finite"));
        }
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(FuzzyError::InvalidUniverse("range must be finite and ascending"));
        }

        let steps = ((max - min) / step + STEP_EPSILON).floor();

        // Also catches an infinite span from subtracting huge bounds
        if !steps.is_finite() || steps >= Self::MAX_POINTS as f64 {
            return Err(FuzzyError::InvalidUniverse("range and step give too many points"));
        }

        let steps = steps as usize;
        let mut end = min + step * steps as f64;

        if (max - end).abs() <= step * STEP_EPSILON {
            end = max;
        }

        Self::from_points(Linspace::new(min, end, steps + 1).collect::<Vec<_>>())
    }

    pub fn linspace(range: RangeInclusive<f64>, n: usize) -> Result<Self> {
        let (min, max) = (*range.start(), *range.end());

        if n == 0 {
            return Err(FuzzyError::InvalidUniverse("a universe needs at least one point"));
        }
        if n > Self::MAX_POINTS {
            return Err(FuzzyError::InvalidUniverse("too many points requested"));
        }
        if n > 1 && min >= max {
            return Err(FuzzyError::InvalidUniverse("range must be finite and ascending"));
        }

        Self::from_points(Linspace::new(min, max, n).collect::<Vec<_>>())
    }

    pub fn points(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Crisp value reported when an output's aggregated set is empty.
    pub fn midpoint(&self) -> f64 {
        (self.min() + self.max()) / 2.
    }

    pub fn clip(&self, x: f64) -> f64 {
        x.clamp(self.min(), self.max())
    }
}

#[test]
fn test_with_step_matches_arange() {
    let floors = Universe::with_step(1. ..=18., 1.).unwrap();

    assert_eq!(floors.len(), 18);
    assert_eq!(floors.min(), 1.);
    assert_eq!(floors.max(), 18.);

    let tenths = Universe::with_step(0. ..=0.3, 0.1).unwrap();

    assert_eq!(tenths.len(), 4);
    assert_eq!(tenths.max(), 0.3);

    let uneven = Universe::with_step(0. ..=1., 0.3).unwrap();

    assert_eq!(uneven.len(), 4);
    assert!((uneven.max() - 0.9).abs() < 1e-12);
}

#[test]
fn test_invalid_universes() {
    assert!(matches!(Universe::from_points(Vec::<f64>::new()), Err(FuzzyError::InvalidUniverse(_))));
    assert!(matches!(Universe::from_points(vec![0., 0.]), Err(FuzzyError::InvalidUniverse(_))));
    assert!(matches!(Universe::from_points(vec![1., f64::NAN]), Err(FuzzyError::InvalidUniverse(_))));
    assert!(matches!(Universe::with_step(0. ..=1., 0.), Err(FuzzyError::InvalidUniverse(_))));
    assert!(matches!(Universe::with_step(5. ..=1., 1.), Err(FuzzyError::InvalidUniverse(_))));
    assert!(matches!(Universe::linspace(0. ..=1., 0), Err(FuzzyError::InvalidUniverse(_))));
}

#[test]
fn test_oversized_universes_fail_fast() {
    assert!(matches!(Universe::with_step(0. ..=1e20, 1.), Err(FuzzyError::InvalidUniverse(_))));
    assert!(matches!(
        Universe::with_step(-f64::MAX..=f64::MAX, 1.),
        Err(FuzzyError::InvalidUniverse(_))
    ));
    assert!(matches!(
        Universe::with_step(0. ..=1., f64::MIN_POSITIVE),
        Err(FuzzyError::InvalidUniverse(_))
    ));
    assert!(matches!(
        Universe::linspace(0. ..=1., usize::MAX),
        Err(FuzzyError::InvalidUniverse(_))
    ));

    let largest = Universe::with_step(0. ..=(Universe::MAX_POINTS - 1) as f64, 1.).unwrap();

    assert_eq!(largest.len(), Universe::MAX_POINTS);
}

#[test]
fn test_midpoint_and_clip() {
    let universe = Universe::with_step(0. ..=4., 1.).unwrap();

    assert_eq!(universe.midpoint(), 2.);
    assert_eq!(universe.clip(-3.), 0.);
    assert_eq!(universe.clip(7.5), 4.);
    assert_eq!(universe.clip(2.5), 2.5);
}
