use std::iter::Sum;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::math::{interp, trapezoids};

/// And operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndOp {
    #[default]
    Min,
    Prod,
    BoundedProd,
    DrasticProd,
}

impl AndOp {
    pub fn apply<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Min => F::min(u, v),
            Self::Prod => u * v,
            Self::BoundedProd => F::max(F::zero(), u + v - F::one()),
            Self::DrasticProd => {
                if u == F::one() {
                    v
                } else if v == F::one() {
                    u
                } else {
                    F::zero()
                }
            },
        }
    }
}

/// Or operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrOp {
    #[default]
    Max,
    ProbOr,
    BoundedSum,
    DrasticSum,
}

impl OrOp {
    pub fn apply<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::ProbOr => u + v - u * v,
            Self::BoundedSum => F::min(F::one(), u + v),
            Self::DrasticSum => {
                if u == F::zero() {
                    v
                } else if v == F::zero() {
                    u
                } else {
                    F::one()
                }
            },
        }
    }
}

/// How a rule's firing strength shapes its consequent term.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplicationOp {
    /// Mamdani: clip the term at the firing strength
    #[default]
    Min,
    /// Larsen: scale the term by the firing strength
    Prod,
}

impl ImplicationOp {
    pub fn call<F: Float>(self, strength: F, membership: impl IntoIterator<Item = F>) -> impl Iterator<Item = F> {
        membership.into_iter().map(move |m| match self {
            Self::Min => F::min(strength, m),
            Self::Prod => strength * m,
        })
    }
}

/// Method for aggregating the consequences of the fuzzy rules
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
    #[default]
    Max,
    ProbOr,
    BoundedSum,
}

impl AggregationOp {
    pub fn call<F: Float>(
        self,
        u: impl IntoIterator<Item = F>,
        v: impl IntoIterator<Item = F>,
    ) -> impl Iterator<Item = F> {
        let or_op = match self {
            Self::Max => OrOp::Max,
            Self::ProbOr => OrOp::ProbOr,
            Self::BoundedSum => OrOp::BoundedSum,
        };

        u.into_iter().zip(v).map(move |(u, v)| or_op.apply(u, v))
    }
}

/// Method for defuzzifcating the resulting membership function.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefuzzificationOp {
    /// Membership-weighted mean of the sample points
    #[default]
    Centroid,
    /// Center of gravity of the piecewise-linear area under the samples
    AreaCentroid,
    /// Point splitting the area under the samples in half
    Bisector,
    /// Mean of the values for which the membership function is maximum
    MeanOfMaximum,
    /// Smallest value for which the membership function is maximum
    SmallestOfMaximum,
    /// Largest value for which the membership function is maximum
    LargestOfMaximum,
}

impl DefuzzificationOp {
    /// Returns `None` when the membership is zero everywhere, where every
    /// method is undefined.
    pub fn call<F: Float + Sum>(self, universe: &[F], membership: &[F]) -> Option<F> {
        debug_assert_eq!(universe.len(), membership.len());

        let maximum = membership.iter().copied().fold(F::zero(), F::max);

        if maximum <= F::zero() {
            return None;
        }

        let maxima = || {
            universe
                .iter()
                .copied()
                .zip(membership.iter().copied())
                .filter_map(move |(u, m)| if m == maximum { Some(u) } else { None })
        };

        match self {
            Self::Centroid => {
                let num = universe.iter().zip(membership).map(|(&x, &m)| x * m).sum::<F>();
                let den = membership.iter().copied().sum::<F>();

                Some(num / den)
            },
            Self::AreaCentroid => {
                if universe.len() == 1 {
                    return Some(universe[0]);
                }

                let (mut num, mut den) = (F::zero(), F::zero());

                for (area, center) in trapezoids(universe, membership) {
                    num = num + area * center;
                    den = den + area;
                }

                Some(num / den)
            },
            Self::Bisector => {
                if universe.len() == 1 {
                    return Some(universe[0]);
                }

                let areas: Vec<F> = trapezoids(universe, membership).map(|(area, _)| area).collect();
                let target = areas.iter().copied().sum::<F>() / F::from(2.)?;
                let mut cum_area = F::zero();

                for (i, area) in areas.iter().copied().enumerate() {
                    if cum_area + area >= target {
                        let xp = [universe[i], universe[i + 1]];
                        let fp = [cum_area, cum_area + area];

                        // Linear in the cumulative area is exact for rectangles and a
                        // close approximation for the sloped pieces
                        return interp(&[target], xp.into_iter().zip(fp).map(|(x, f)| (f, x)))
                            .first()
                            .copied();
                    }

                    cum_area = cum_area + area;
                }

                universe.last().copied()
            },
            Self::MeanOfMaximum => {
                let (len, sum) = maxima().fold((0usize, F::zero()), |(len, sum), u| (len + 1, sum + u));

                Some(sum / F::from(len)?)
            },
            Self::SmallestOfMaximum => maxima().reduce(F::min),
            Self::LargestOfMaximum => maxima().reduce(F::max),
        }
    }
}

#[test]
fn test_t_norms() {
    assert_eq!(AndOp::Min.apply(0.3, 0.8), 0.3);
    assert_eq!(AndOp::Prod.apply(0.5, 0.5), 0.25);
    assert_eq!(AndOp::BoundedProd.apply(0.3, 0.5), 0.);
    assert_eq!(AndOp::DrasticProd.apply(1., 0.4), 0.4);
    assert_eq!(AndOp::DrasticProd.apply(0.9, 0.4), 0.);
    assert_eq!(OrOp::Max.apply(0.3, 0.8), 0.8);
    assert_eq!(OrOp::ProbOr.apply(0.5, 0.5), 0.75);
    assert_eq!(OrOp::BoundedSum.apply(0.7, 0.5), 1.);
    assert_eq!(OrOp::DrasticSum.apply(0., 0.4), 0.4);
    assert_eq!(OrOp::DrasticSum.apply(0.1, 0.4), 1.);
}

#[test]
fn test_implication_clips_and_scales() {
    let term = [0., 0.5, 1., 0.5, 0.];

    assert_eq!(
        ImplicationOp::Min.call(0.6, term).collect::<Vec<_>>(),
        vec![0., 0.5, 0.6, 0.5, 0.]
    );
    assert_eq!(
        ImplicationOp::Prod.call(0.5, term).collect::<Vec<_>>(),
        vec![0., 0.25, 0.5, 0.25, 0.]
    );
}

#[test]
fn test_aggregation_is_pointwise() {
    let agg: Vec<f64> = AggregationOp::Max.call([0., 0.2, 0.9], [0.5, 0.1, 0.3]).collect();

    assert_eq!(agg, vec![0.5, 0.2, 0.9]);
}

#[test]
fn test_defuzzify_symmetric_triangle() {
    let universe = [0., 1., 2., 3., 4., 5., 6.];
    let membership = [0., 0.25, 0.5, 0.75, 0.5, 0.25, 0.];

    for op in [
        DefuzzificationOp::Centroid,
        DefuzzificationOp::AreaCentroid,
        DefuzzificationOp::Bisector,
        DefuzzificationOp::MeanOfMaximum,
        DefuzzificationOp::SmallestOfMaximum,
        DefuzzificationOp::LargestOfMaximum,
    ] {
        let crisp = op.call(&universe, &membership).unwrap();

        assert!((crisp - 3.).abs() < 1e-12, "{op:?} gave {crisp}");
    }
}

#[test]
fn test_defuzzify_plateau_maxima() {
    let universe = [0., 1., 2., 3., 4.];
    let membership = [0., 0.6, 0.6, 0.6, 0.2];

    assert_eq!(DefuzzificationOp::SmallestOfMaximum.call(&universe, &membership), Some(1.));
    assert_eq!(DefuzzificationOp::LargestOfMaximum.call(&universe, &membership), Some(3.));
    assert_eq!(DefuzzificationOp::MeanOfMaximum.call(&universe, &membership), Some(2.));
}

#[test]
fn test_defuzzify_all_zero_is_undefined() {
    let universe = [0., 1., 2.];

    assert_eq!(DefuzzificationOp::Centroid.call(&universe, &[0., 0., 0.]), None);
    assert_eq!(DefuzzificationOp::Bisector.call(&universe, &[0., 0., 0.]), None);
}
