//! Property-based checks of the inference building blocks using proptest

use fuzzy_assign::{
    AggregationOp, AndOp, ControlSystem, DefuzzificationOp, ImplicationOp, MembershipFunction, OrOp, Universe,
};
use proptest::prelude::*;

/// Ordered triangle parameters `a <= b <= c` on [-100, 100]
fn triangle_strategy() -> impl Strategy<Value = (f64, f64, f64)> {
    prop::array::uniform3(-100.0f64..100.0).prop_map(|mut abc| {
        abc.sort_by(|x, y| x.total_cmp(y));
        (abc[0], abc[1], abc[2])
    })
}

/// Three inputs on [0, 1] whose single term `t` has degree equal to the
/// crisp value, so firing strengths expose the premise evaluation directly.
fn identity_premises() -> ControlSystem {
    let mut builder = ControlSystem::builder();
    let unit = Universe::linspace(0. ..=1., 101).unwrap();
    let ramp = MembershipFunction::triangular(0., 1., 1.).unwrap();
    let x = builder.add_input("x", unit.clone()).unwrap();
    let y = builder.add_input("y", unit.clone()).unwrap();
    let z = builder.add_input("z", unit.clone()).unwrap();
    let out = builder.add_output("out", unit).unwrap();

    for var in [x, y, z] {
        builder.define_term(var, "t", ramp).unwrap();
    }
    builder.define_term(out, "t", ramp).unwrap();

    let (x, y, z) = (
        builder.is(x, "t").unwrap(),
        builder.is(y, "t").unwrap(),
        builder.is(z, "t").unwrap(),
    );
    let then = builder.then(out, "t").unwrap();
    let premises = [
        x.clone() & y.clone(),
        x.clone() | y.clone(),
        (x.clone() & y.clone()) | !z.clone(),
        (x.clone() | y) & (z & !x),
    ];

    for premise in premises {
        builder.rule(premise, [then]).unwrap();
    }

    builder.build().unwrap()
}

proptest! {
    #[test]
    fn triangle_degree_stays_in_unit_interval((a, b, c) in triangle_strategy(), x in -200.0f64..200.0) {
        let tri = MembershipFunction::triangular(a, b, c).unwrap();
        let degree = tri.degree(x);

        prop_assert!((0.0..=1.0).contains(&degree), "degree({}) = {}", x, degree);
    }

    #[test]
    fn triangle_is_zero_outside_support((a, b, c) in triangle_strategy(), offset in 0.001f64..100.0) {
        let tri = MembershipFunction::triangular(a, b, c).unwrap();

        prop_assert_eq!(tri.degree(a - offset), 0.0);
        prop_assert_eq!(tri.degree(c + offset), 0.0);
        prop_assert_eq!(tri.degree(b), 1.0);
    }

    #[test]
    fn triangle_rises_then_falls(
        (a, b, c) in triangle_strategy(),
        s in 0.0f64..1.0,
        t in 0.0f64..1.0,
    ) {
        let tri = MembershipFunction::triangular(a, b, c).unwrap();
        let (lo, hi) = if s <= t { (s, t) } else { (t, s) };

        // Non-decreasing on [a, b]
        prop_assert!(tri.degree(a + (b - a) * lo) <= tri.degree(a + (b - a) * hi) + 1e-12);
        // Non-increasing on [b, c]
        prop_assert!(tri.degree(b + (c - b) * lo) + 1e-12 >= tri.degree(b + (c - b) * hi));
    }

    #[test]
    fn premises_combine_with_min_and_max(x in 0.0f64..=1.0, y in 0.0f64..=1.0, z in 0.0f64..=1.0) {
        let system = identity_premises();
        let mut sim = system.simulation();

        sim.set_input("x", x).unwrap();
        sim.set_input("y", y).unwrap();
        sim.set_input("z", z).unwrap();
        sim.compute().unwrap();

        let expected = [
            x.min(y),
            x.max(y),
            x.min(y).max(1. - z),
            x.max(y).min(z.min(1. - x)),
        ];

        prop_assert_eq!(sim.firing_strengths().unwrap(), &expected[..]);
    }

    #[test]
    fn default_operators_are_min_and_max(u in 0.0f64..=1.0, v in 0.0f64..=1.0) {
        prop_assert_eq!(AndOp::default().apply(u, v), u.min(v));
        prop_assert_eq!(OrOp::default().apply(u, v), u.max(v));
    }

    #[test]
    fn aggregation_is_pointwise_max_of_implications(
        strengths in prop::collection::vec(0.0f64..=1.0, 1..6),
        x in 0.0f64..=10.0,
    ) {
        let term = MembershipFunction::triangular(2., 5., 8.).unwrap();
        let degree = term.degree(x);
        let aggregated = strengths.iter().fold(vec![0.], |agg, &strength| {
            let implicated: Vec<f64> = ImplicationOp::Min.call(strength, [degree]).collect();

            AggregationOp::Max.call(agg, implicated).collect()
        });
        let expected = strengths.iter().map(|s| s.min(degree)).fold(0., f64::max);

        prop_assert_eq!(aggregated[0], expected);
    }

    #[test]
    fn auto_partition_sums_to_one(n in 2usize..9, x in 0.0f64..=10.0) {
        let mut builder = ControlSystem::builder();
        let var = builder.add_input("x", Universe::with_step(0. ..=10., 0.5).unwrap()).unwrap();

        builder.auto_partition(var, n).unwrap();

        let system = builder.build().unwrap();
        let total: f64 = system
            .variable("x")
            .unwrap()
            .terms()
            .iter()
            .map(|term| term.membership().degree(x))
            .sum();

        prop_assert!((total - 1.).abs() < 1e-9, "sum at {} was {}", x, total);
    }

    #[test]
    fn centroid_of_symmetric_triangle_is_its_peak(peak in 2i32..=8, half in 1i32..=2, height in 0.05f64..=1.0) {
        let universe = Universe::with_step(0. ..=10., 1.).unwrap();
        let (peak, half) = (f64::from(peak), f64::from(half));
        let tri = MembershipFunction::triangular(peak - half, peak, peak + half).unwrap();
        let membership: Vec<f64> = ImplicationOp::Min.call(height, tri.sample(universe.points())).collect();
        let crisp = DefuzzificationOp::Centroid.call(universe.points(), &membership).unwrap();

        prop_assert!((crisp - peak).abs() < 1e-9);
    }
}
