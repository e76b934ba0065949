use tracing::debug;

use crate::error::{FuzzyError, Result};
use crate::inputs::Inputs;
use crate::outputs::{Inferred, Outputs};
use crate::system::ControlSystem;
use crate::variable::{Input, Output, Role, Variable};

/// Where a `Simulation` is in its input → compute → output lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SimulationState {
    /// No inputs set yet
    Uninitialized,
    /// Some, but not all, inputs used by the rules are set
    InputsPartial,
    /// Every input used by the rules is set; `compute` may run
    InputsComplete,
    /// Outputs are available
    Computed,
}

/// One evaluation of a `ControlSystem`.
///
/// Cheap to create, so each request should get its own rather than sharing
/// one behind a lock. Changing an input discards previous outputs.
///
/// ```
/// # use fuzzy_assign::*;
/// # fn main() -> Result<()> {
/// let mut builder = ControlSystem::builder();
/// let load = builder.add_input("load", Universe::with_step(0. ..=100., 1.)?)?;
/// let priority = builder.add_output("priority", Universe::with_step(0. ..=10., 1.)?)?;
///
/// builder.define_term(load, "heavy", MembershipFunction::triangular(50., 100., 100.)?)?;
/// builder.define_term(priority, "high", MembershipFunction::triangular(5., 10., 10.)?)?;
///
/// let premise = builder.is(load, "heavy")?;
/// let consequent = builder.then(priority, "high")?;
///
/// builder.rule(premise, [consequent])?;
///
/// let system = builder.build()?;
/// let mut sim = system.simulation();
///
/// sim.set_input("load", 80.)?;
/// sim.compute()?;
///
/// let crisp = sim.get_output("priority")?;
/// assert!(crisp > 5. && crisp < 10.);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Simulation<'s> {
    system: &'s ControlSystem,
    inputs: Inputs,
    outputs: Option<Outputs>,
    clip_to_bounds: bool,
}

impl<'s> Simulation<'s> {
    pub fn new(system: &'s ControlSystem) -> Self {
        Self {
            system,
            inputs: Inputs::new(),
            outputs: None,
            clip_to_bounds: true,
        }
    }

    /// Whether inputs outside a variable's universe are clamped onto it
    /// before fuzzification. On by default.
    pub fn clip_to_bounds(mut self, clip: bool) -> Self {
        self.clip_to_bounds = clip;
        self
    }

    pub fn system(&self) -> &'s ControlSystem {
        self.system
    }

    pub fn set_input(&mut self, name: &str, value: f64) -> Result<()> {
        let var = self.system.input(name)?;

        self.set(var, value)
    }

    pub fn set(&mut self, var: Variable<Input>, value: f64) -> Result<()> {
        let def = self
            .system
            .resolve(var)
            .ok_or(FuzzyError::ForeignHandle(Role::Input))?;

        if !value.is_finite() {
            return Err(FuzzyError::InvalidInput {
                name: def.name().to_owned(),
            });
        }

        let value = if self.clip_to_bounds {
            def.universe().clip(value)
        } else {
            value
        };

        self.inputs.insert(var.0, value);
        self.outputs = None;

        Ok(())
    }

    pub fn state(&self) -> SimulationState {
        if self.outputs.is_some() {
            SimulationState::Computed
        } else if self.missing_inputs().next().is_none() {
            SimulationState::InputsComplete
        } else if self.inputs.is_empty() {
            SimulationState::Uninitialized
        } else {
            SimulationState::InputsPartial
        }
    }

    /// Inputs used by the rules that still have no value.
    pub fn missing_inputs(&self) -> impl Iterator<Item = &'s str> + '_ {
        let system = self.system;

        system
            .required_inputs
            .iter()
            .filter(move |key| self.inputs.value(**key).is_none())
            .map(move |key| system.def(*key).name())
    }

    /// Runs inference over the current inputs, replacing any earlier
    /// outputs.
    pub fn compute(&mut self) -> Result<()> {
        if let Some(missing) = self.missing_inputs().next() {
            return Err(FuzzyError::MissingInput(missing.to_owned()));
        }

        let outputs = self.system.infer(&self.inputs)?;

        debug!(inputs = self.inputs.len(), "simulation computed");
        self.outputs = Some(outputs);

        Ok(())
    }

    pub fn get_output(&self, name: &str) -> Result<f64> {
        Ok(self.inferred(name)?.crisp)
    }

    pub fn output(&self, var: Variable<Output>) -> Result<f64> {
        let def = self
            .system
            .resolve(var)
            .ok_or(FuzzyError::ForeignHandle(Role::Output))?;

        self.outputs
            .as_ref()
            .ok_or(FuzzyError::NotComputed)?
            .crisp(var)
            .ok_or_else(|| FuzzyError::UndefinedVariable {
                name: def.name().to_owned(),
                role: Role::Output,
            })
    }

    /// Aggregated membership of an output, aligned with its universe.
    pub fn aggregated(&self, name: &str) -> Result<&[f64]> {
        Ok(&self.inferred(name)?.aggregated)
    }

    /// Whether the output fell back to its universe midpoint because no rule
    /// fired for it.
    pub fn fell_back(&self, name: &str) -> Result<bool> {
        Ok(self.inferred(name)?.fell_back)
    }

    pub fn firing_strengths(&self) -> Result<&[f64]> {
        Ok(self.outputs.as_ref().ok_or(FuzzyError::NotComputed)?.firing_strengths())
    }

    /// Drops all inputs and outputs.
    pub fn reset(&mut self) {
        self.inputs.clear();
        self.outputs = None;
    }

    fn inferred(&self, name: &str) -> Result<&Inferred> {
        let var = self.system.output(name)?;
        let outputs = self.outputs.as_ref().ok_or(FuzzyError::NotComputed)?;

        outputs.by_key(var.0).ok_or_else(|| FuzzyError::UndefinedVariable {
            name: name.to_owned(),
            role: Role::Output,
        })
    }
}

#[cfg(test)]
fn two_input_system() -> ControlSystem {
    use crate::terms::MembershipFunction;
    use crate::universe::Universe;

    let mut builder = ControlSystem::builder();
    let load = builder
        .add_input("load", Universe::with_step(0. ..=100., 1.).unwrap())
        .unwrap();
    let speed = builder
        .add_input("speed", Universe::with_step(0. ..=10., 1.).unwrap())
        .unwrap();
    let priority = builder
        .add_output("priority", Universe::with_step(0. ..=10., 1.).unwrap())
        .unwrap();

    builder
        .define_term(load, "heavy", MembershipFunction::triangular(50., 100., 100.).unwrap())
        .unwrap();
    builder.auto_partition(speed, 3).unwrap();
    builder.auto_partition_named(priority, ["low", "high"]).unwrap();

    let premise = builder.is(load, "heavy").unwrap() & builder.is(speed, "good").unwrap();
    let high = builder.then(priority, "high").unwrap();

    builder.rule(premise, [high]).unwrap();
    builder.build().unwrap()
}

#[test]
fn test_state_machine() {
    let system = two_input_system();
    let mut sim = system.simulation();

    assert_eq!(sim.state(), SimulationState::Uninitialized);
    assert_eq!(sim.get_output("priority"), Err(FuzzyError::NotComputed));
    assert_eq!(sim.compute(), Err(FuzzyError::MissingInput("load".into())));

    sim.set_input("load", 90.).unwrap();

    assert_eq!(sim.state(), SimulationState::InputsPartial);
    assert_eq!(sim.missing_inputs().collect::<Vec<_>>(), ["speed"]);
    assert_eq!(sim.compute(), Err(FuzzyError::MissingInput("speed".into())));

    sim.set_input("speed", 10.).unwrap();

    assert_eq!(sim.state(), SimulationState::InputsComplete);

    sim.compute().unwrap();

    assert_eq!(sim.state(), SimulationState::Computed);
    assert_eq!(sim.firing_strengths().unwrap(), &[0.8]);

    sim.set_input("speed", 0.).unwrap();

    assert_eq!(sim.state(), SimulationState::InputsComplete);
    assert_eq!(sim.get_output("priority"), Err(FuzzyError::NotComputed));

    sim.reset();

    assert_eq!(sim.state(), SimulationState::Uninitialized);
}

#[test]
fn test_unknown_names_rejected() {
    let system = two_input_system();
    let mut sim = system.simulation();

    assert_eq!(
        sim.set_input("priority", 1.),
        Err(FuzzyError::UndefinedVariable {
            name: "priority".into(),
            role: Role::Input,
        })
    );
    assert!(matches!(
        sim.set_input("altitude", 1.),
        Err(FuzzyError::UndefinedVariable { .. })
    ));
    assert_eq!(
        sim.set_input("load", f64::NAN),
        Err(FuzzyError::InvalidInput { name: "load".into() })
    );

    sim.set_input("load", 60.).unwrap();
    sim.set_input("speed", 5.).unwrap();
    sim.compute().unwrap();

    assert!(matches!(
        sim.get_output("load"),
        Err(FuzzyError::UndefinedVariable { role: Role::Output, .. })
    ));
}

#[test]
fn test_recompute_discards_stale_aggregate() {
    let system = two_input_system();
    let mut sim = system.simulation();

    sim.set_input("load", 100.).unwrap();
    sim.set_input("speed", 10.).unwrap();
    sim.compute().unwrap();

    assert!(!sim.fell_back("priority").unwrap());
    // high rises linearly over the whole universe, so the centroid is
    // sum(x^2) / sum(x) over 0..=10
    assert!((sim.get_output("priority").unwrap() - 7.).abs() < 1e-9);

    sim.set_input("load", 0.).unwrap();
    sim.compute().unwrap();

    assert!(sim.fell_back("priority").unwrap());
    assert!(sim.aggregated("priority").unwrap().iter().all(|m| *m == 0.));
    assert_eq!(sim.get_output("priority").unwrap(), 5.);
}

#[test]
fn test_inputs_clipped_to_universe() {
    let system = two_input_system();
    let mut clipped = system.simulation();
    let mut raw = system.simulation().clip_to_bounds(false);

    for sim in [&mut clipped, &mut raw] {
        sim.set_input("load", 250.).unwrap();
        sim.set_input("speed", 10.).unwrap();
        sim.compute().unwrap();
    }

    assert_eq!(clipped.firing_strengths().unwrap(), &[1.]);
    assert_eq!(raw.firing_strengths().unwrap(), &[0.]);
}

#[test]
fn test_handle_from_another_system_rejected() {
    let first = two_input_system();
    let second = two_input_system();
    let first_load = first.input("load").unwrap();
    let mut sim = second.simulation();

    assert_eq!(sim.set(first_load, 70.), Err(FuzzyError::ForeignHandle(Role::Input)));
    assert_eq!(sim.state(), SimulationState::Uninitialized);
    assert_eq!(sim.missing_inputs().collect::<Vec<_>>(), ["load", "speed"]);
    assert_eq!(
        sim.output(first.output("priority").unwrap()),
        Err(FuzzyError::ForeignHandle(Role::Output))
    );

    sim.set(second.input("load").unwrap(), 70.).unwrap();

    assert_eq!(sim.missing_inputs().collect::<Vec<_>>(), ["speed"]);

    let err = sim.set(first_load, 70.).unwrap_err().to_string();

    assert!(!err.contains("VariableKey"), "{err}");
}
