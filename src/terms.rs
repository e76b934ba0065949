use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, Result};

/// Maps a crisp value to a degree of membership in `[0, 1]`.
///
/// Constructed through the checked constructors, so parameters are always
/// finite and ordered.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipFunction {
    Triangular { a: f64, b: f64, c: f64 },
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    Gaussian { mean: f64, sigma: f64 },
}

impl MembershipFunction {
    pub fn triangular(a: f64, b: f64, c: f64) -> Result<Self> {
        check_ordered("triangular", &[a, b, c])?;

        Ok(Self::Triangular { a, b, c })
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        check_ordered("trapezoidal", &[a, b, c, d])?;

        Ok(Self::Trapezoidal { a, b, c, d })
    }

    pub fn gaussian(mean: f64, sigma: f64) -> Result<Self> {
        if !(mean.is_finite() && sigma.is_finite() && sigma > 0.) {
            return Err(FuzzyError::InvalidMembership(format!(
                "gaussian needs a finite mean and a positive sigma, got ({mean}, {sigma})"
            )));
        }

        Ok(Self::Gaussian { mean, sigma })
    }

    /// Re-runs the constructor checks, for values that bypassed them
    /// (deserialization, struct literals).
    pub fn validate(self) -> Result<Self> {
        match self {
            Self::Triangular { a, b, c } => Self::triangular(a, b, c),
            Self::Trapezoidal { a, b, c, d } => Self::trapezoidal(a, b, c, d),
            Self::Gaussian { mean, sigma } => Self::gaussian(mean, sigma),
        }
    }

    pub fn degree(&self, x: f64) -> f64 {
        match *self {
            Self::Triangular { a, b, c } => plateau(x, a, b, b, c),
            Self::Trapezoidal { a, b, c, d } => plateau(x, a, b, c, d),
            Self::Gaussian { mean, sigma } => (-(x - mean).powi(2) / (2. * sigma * sigma)).exp(),
        }
    }

    /// Samples the function at every point of `universe`.
    pub fn sample(&self, universe: &[f64]) -> Vec<f64> {
        universe.iter().map(|&x| self.degree(x)).collect()
    }
}

fn check_ordered(shape: &str, params: &[f64]) -> Result<()> {
    if params.iter().any(|p| !p.is_finite()) {
        return Err(FuzzyError::InvalidMembership(format!(
            "{shape} parameters must be finite, got {params:?}"
        )));
    }
    if params.windows(2).any(|w| w[0] > w[1]) {
        return Err(FuzzyError::InvalidMembership(format!(
            "{shape} parameters must be non-decreasing, got {params:?}"
        )));
    }

    Ok(())
}

// Rises over [a, b], is 1 on [b, c], falls over [c, d]. A zero-width edge is
// a vertical step, never a division.
fn plateau(x: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if b <= x && x <= c {
        1.
    } else if a < x && x < b {
        (x - a) / (b - a)
    } else if c < x && x < d {
        (d - x) / (d - c)
    } else {
        0.
    }
}

/// Index of a term within its variable, in definition order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TermId(pub(crate) usize);

/// A named linguistic category of a variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub(crate) name: String,
    pub(crate) membership: MembershipFunction,
}

impl Term {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn membership(&self) -> &MembershipFunction {
        &self.membership
    }
}

/// Default labels for an `n`-way auto-partition, from worst to best.
pub(crate) fn partition_labels(n: usize) -> Vec<String> {
    let quality: &[&str] = match n {
        3 => &["poor", "average", "good"],
        5 => &["poor", "mediocre", "average", "decent", "good"],
        7 => &["dismal", "poor", "mediocre", "average", "decent", "good", "excellent"],
        _ => return (1..=n).map(|i| format!("term{i}")).collect(),
    };

    quality.iter().map(|label| label.to_string()).collect()
}

#[test]
fn test_triangle_shape() {
    let tri = MembershipFunction::triangular(2., 4., 8.).unwrap();

    assert_eq!(tri.degree(2.), 0.);
    assert_eq!(tri.degree(4.), 1.);
    assert_eq!(tri.degree(8.), 0.);
    assert_eq!(tri.degree(3.), 0.5);
    assert_eq!(tri.degree(6.), 0.5);
    assert_eq!(tri.degree(-100.), 0.);
    assert_eq!(tri.degree(100.), 0.);
}

#[test]
fn test_triangle_shoulders() {
    let left = MembershipFunction::triangular(0., 0., 50.).unwrap();
    let right = MembershipFunction::triangular(50., 100., 100.).unwrap();

    assert_eq!(left.degree(0.), 1.);
    assert_eq!(left.degree(25.), 0.5);
    assert_eq!(right.degree(100.), 1.);
    assert_eq!(right.degree(80.), 0.6);
    assert_eq!(right.degree(101.), 0.);
}

#[test]
fn test_zero_width_triangle() {
    let impulse = MembershipFunction::triangular(3., 3., 3.).unwrap();

    assert_eq!(impulse.degree(3.), 1.);
    assert_eq!(impulse.degree(2.999), 0.);
    assert_eq!(impulse.degree(3.001), 0.);
    assert!(!impulse.degree(3.).is_nan());
}

#[test]
fn test_trapezoid_and_gaussian() {
    let trap = MembershipFunction::trapezoidal(0., 2., 4., 8.).unwrap();

    assert_eq!(trap.degree(1.), 0.5);
    assert_eq!(trap.degree(3.), 1.);
    assert_eq!(trap.degree(6.), 0.5);

    let gauss = MembershipFunction::gaussian(5., 1.).unwrap();

    assert_eq!(gauss.degree(5.), 1.);
    assert!((gauss.degree(6.) - (-0.5f64).exp()).abs() < 1e-12);
}

#[test]
fn test_malformed_parameters_fail_fast() {
    assert!(matches!(
        MembershipFunction::triangular(5., 1., 10.),
        Err(FuzzyError::InvalidMembership(_))
    ));
    assert!(matches!(
        MembershipFunction::trapezoidal(0., 1., 3., 2.),
        Err(FuzzyError::InvalidMembership(_))
    ));
    assert!(matches!(
        MembershipFunction::gaussian(0., 0.),
        Err(FuzzyError::InvalidMembership(_))
    ));
    assert!(MembershipFunction::Triangular { a: 1., b: 0., c: 2. }.validate().is_err());
}

#[test]
fn test_partition_labels() {
    assert_eq!(partition_labels(3), ["poor", "average", "good"]);
    assert_eq!(partition_labels(7)[6], "excellent");
    assert_eq!(partition_labels(4), ["term1", "term2", "term3", "term4"]);
}
