use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, debug_span, trace};

use crate::dsl::TermRef;
use crate::error::{FuzzyError, Result};
use crate::inputs::Inputs;
use crate::ops::*;
use crate::outputs::{Inferred, Outputs};
use crate::system::ControlSystem;
use crate::universe::Universe;
use crate::variable::{Role, VariableKey};

/// Degrees of every term of every fuzzified input, in term order.
pub type Fuzzified = SecondaryMap<VariableKey, Vec<f64>>;

/// Operator selection for Mamdani-style inference.
///
/// The default is the classic min/max configuration: AND = min, OR = max,
/// implication clips with min, aggregation takes the pointwise max and the
/// result is defuzzified by centroid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MamdaniInference {
    pub and_op: AndOp,
    pub or_op: OrOp,
    pub imp_op: ImplicationOp,
    pub agg_op: AggregationOp,
    pub defuzz_op: DefuzzificationOp,
}

impl MamdaniInference {
    pub fn new(
        and_op: AndOp,
        or_op: OrOp,
        imp_op: ImplicationOp,
        agg_op: AggregationOp,
        defuzz_op: DefuzzificationOp,
    ) -> Self {
        Self {
            and_op,
            or_op,
            imp_op,
            agg_op,
            defuzz_op,
        }
    }

    pub fn infer(&self, system: &ControlSystem, inputs: &Inputs) -> Result<Outputs> {
        let _span = debug_span!("infer", rules = system.rules.len()).entered();

        let fuzzified = self.fuzzify(system, inputs)?;
        let firing_strengths = self.fire(system, &fuzzified)?;
        let aggregated = self.aggregate(system, &firing_strengths);
        let mut inferred = SecondaryMap::with_capacity(aggregated.len());

        for (key, membership) in aggregated {
            let var = system.def(key);
            let (crisp, fell_back) = match self.defuzzify(var.name(), var.universe(), &membership) {
                Ok(crisp) => (crisp, false),
                Err(FuzzyError::DegenerateAggregate(name)) => {
                    let midpoint = var.universe().midpoint();

                    debug!(output = %name, midpoint, "no rule fired, using universe midpoint");
                    (midpoint, true)
                },
                Err(err) => return Err(err),
            };

            debug!(output = var.name(), crisp, "defuzzified");
            inferred.insert(
                key,
                Inferred {
                    aggregated: membership,
                    crisp,
                    fell_back,
                },
            );
        }

        Ok(Outputs::new(system.id, inferred, firing_strengths))
    }

    /// Degree of every term for each input that has a crisp value.
    ///
    /// Fails with `MissingInput` when an input used by a rule premise has
    /// no value.
    pub fn fuzzify(&self, system: &ControlSystem, inputs: &Inputs) -> Result<Fuzzified> {
        if inputs.owner().is_some_and(|owner| owner != system.id) {
            return Err(FuzzyError::ForeignHandle(Role::Input));
        }
        if let Some(missing) = system
            .required_inputs
            .iter()
            .find(|key| inputs.value(**key).is_none())
        {
            return Err(FuzzyError::MissingInput(system.def(*missing).name().to_owned()));
        }

        let mut fuzzified = SecondaryMap::with_capacity(inputs.len());

        for (key, value) in &inputs.values {
            let Some(var) = system.get(key).filter(|var| var.role() == Role::Input) else {
                continue;
            };
            let degrees = var.fuzzify(*value);

            trace!(input = var.name(), value, ?degrees, "fuzzified");
            fuzzified.insert(key, degrees);
        }

        Ok(fuzzified)
    }

    /// Firing strength of every rule, scaled by its weight.
    pub fn fire(&self, system: &ControlSystem, fuzzified: &Fuzzified) -> Result<Vec<f64>> {
        let degree = |term_ref: TermRef| {
            fuzzified
                .get(term_ref.variable)
                .and_then(|degrees| degrees.get(term_ref.term.0))
                .copied()
                .ok_or_else(|| {
                    let var = system.def(term_ref.variable);

                    FuzzyError::UndefinedTerm {
                        variable: var.name().to_owned(),
                        term: var
                            .terms()
                            .get(term_ref.term.0)
                            .map_or_else(|| format!("#{}", term_ref.term.0), |term| term.name().to_owned()),
                    }
                })
        };

        let strengths = system
            .rules
            .iter()
            .map(|rule| -> Result<f64> {
                Ok(rule.premise.evaluate(&degree, self.and_op, self.or_op)? * rule.weight)
            })
            .collect::<Result<Vec<f64>>>()?;

        debug!(?strengths, "fired rules");

        Ok(strengths)
    }

    /// Implicates every fired rule's consequents and folds them into one
    /// membership per output variable.
    ///
    /// Outputs no rule fired for are present and zero everywhere.
    pub fn aggregate(&self, system: &ControlSystem, firing_strengths: &[f64]) -> SecondaryMap<VariableKey, Vec<f64>> {
        let mut aggregated: SecondaryMap<VariableKey, Vec<f64>> = system
            .samples
            .iter()
            .map(|(key, _)| (key, vec![0.; system.def(key).universe().len()]))
            .collect();

        for (rule, &strength) in system.rules.iter().zip(firing_strengths) {
            if strength <= 0. {
                continue;
            }

            for consequent in &rule.consequents {
                let key = consequent.variable();
                let (Some(agg), Some(terms)) = (aggregated.get_mut(key), system.samples.get(key)) else {
                    continue;
                };
                let implicated = self.imp_op.call(strength, terms[consequent.term().0].iter().copied());

                *agg = self.agg_op.call(agg.iter().copied(), implicated).collect();
            }
        }

        aggregated
    }

    /// Crisp value of one aggregated output.
    ///
    /// An all-zero membership yields `DegenerateAggregate`; `infer` turns
    /// that into the universe midpoint.
    pub fn defuzzify(&self, name: &str, universe: &Universe, membership: &[f64]) -> Result<f64> {
        self.defuzz_op
            .call(universe.points(), membership)
            .ok_or_else(|| FuzzyError::DegenerateAggregate(name.to_owned()))
    }
}

#[cfg(test)]
fn fixture() -> ControlSystem {
    use crate::terms::MembershipFunction;

    let mut builder = ControlSystem::builder();
    let load = builder
        .add_input("load", Universe::with_step(0. ..=100., 1.).unwrap())
        .unwrap();
    let priority = builder
        .add_output("priority", Universe::with_step(0. ..=10., 1.).unwrap())
        .unwrap();

    builder
        .define_term(load, "light", MembershipFunction::triangular(0., 0., 50.).unwrap())
        .unwrap();
    builder
        .define_term(load, "heavy", MembershipFunction::triangular(50., 100., 100.).unwrap())
        .unwrap();
    builder
        .define_term(priority, "low", MembershipFunction::triangular(0., 0., 5.).unwrap())
        .unwrap();
    builder
        .define_term(priority, "high", MembershipFunction::triangular(5., 10., 10.).unwrap())
        .unwrap();

    let heavy = builder.is(load, "heavy").unwrap();
    let light = builder.is(load, "light").unwrap();
    let high = builder.then(priority, "high").unwrap();
    let low = builder.then(priority, "low").unwrap();

    builder.rule(heavy, [high]).unwrap();
    builder.rule(light, [low]).unwrap();
    builder.build().unwrap()
}

#[test]
fn test_aggregate_is_pointwise_max_of_implications() {
    let system = fixture();
    let priority = system.output("priority").unwrap();
    let aggregated = MamdaniInference::default().aggregate(&system, &[0.6, 0.3]);
    let membership = &aggregated[priority.key()];
    let universe = system.def(priority.key()).universe().points();
    let terms = &system.samples[priority.key()];

    for (i, x) in universe.iter().enumerate() {
        let high = f64::min(0.6, terms[1][i]);
        let low = f64::min(0.3, terms[0][i]);

        assert_eq!(membership[i], f64::max(high, low), "at {x}");
    }
}

#[test]
fn test_unfired_output_is_all_zero() {
    let system = fixture();
    let priority = system.output("priority").unwrap();
    let aggregated = MamdaniInference::default().aggregate(&system, &[0., 0.]);

    assert!(aggregated[priority.key()].iter().all(|m| *m == 0.));
}

#[test]
fn test_fuzzify_requires_referenced_inputs() {
    let system = fixture();

    assert_eq!(
        MamdaniInference::default().fuzzify(&system, &Inputs::new()).unwrap_err(),
        FuzzyError::MissingInput("load".into())
    );
}

#[test]
fn test_infer_end_to_end() {
    let system = fixture();
    let mut inputs = Inputs::new();

    inputs.add(system.input("load").unwrap(), 80.).unwrap();

    let outputs = system.infer(&inputs).unwrap();
    let priority = system.output("priority").unwrap();

    assert_eq!(outputs.firing_strengths(), &[0.6, 0.]);

    // min(0.6, high) sampled at 5..=10 is 0, .2, .4, .6, .6, .6
    let expected = (6. * 0.2 + 7. * 0.4 + (8. + 9. + 10.) * 0.6) / (0.2 + 0.4 + 3. * 0.6);
    let crisp = outputs.crisp(priority).unwrap();

    assert!((crisp - expected).abs() < 1e-9, "{crisp} != {expected}");
    assert!(crisp > 5. && crisp < 10.);
    assert!(!outputs.inferred(priority).unwrap().fell_back);
}

#[test]
fn test_defuzzify_reports_degenerate_aggregate() {
    let universe = Universe::with_step(0. ..=4., 1.).unwrap();

    assert_eq!(
        MamdaniInference::default().defuzzify("out", &universe, &[0.; 5]),
        Err(FuzzyError::DegenerateAggregate("out".into()))
    );
}

#[test]
fn test_inputs_bound_to_one_system() {
    let first = fixture();
    let second = fixture();
    let mut inputs = Inputs::new();

    inputs.add(first.input("load").unwrap(), 80.).unwrap();

    assert_eq!(
        inputs.add(second.input("load").unwrap(), 80.),
        Err(FuzzyError::ForeignHandle(Role::Input))
    );
    assert_eq!(inputs.get(second.input("load").unwrap()), None);
    assert_eq!(
        second.infer(&inputs).unwrap_err(),
        FuzzyError::ForeignHandle(Role::Input)
    );

    let outputs = first.infer(&inputs).unwrap();

    assert!(outputs.crisp(first.output("priority").unwrap()).is_some());
    assert_eq!(outputs.crisp(second.output("priority").unwrap()), None);
}
