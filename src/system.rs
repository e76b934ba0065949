use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};
use tracing::debug;

use crate::dsl::{Expr, TermRef};
use crate::error::{FuzzyError, Result};
use crate::inference::MamdaniInference;
use crate::inputs::Inputs;
use crate::outputs::Outputs;
use crate::rules::{Consequent, Rule, Rules};
use crate::simulation::Simulation;
use crate::terms::MembershipFunction;
use crate::universe::Universe;
use crate::variable::{Input, Output, Role, SystemId, Variable, VariableDef, VariableKey, VariableRole};

/// Collects variables, terms and rules, then freezes them into a
/// `ControlSystem`.
#[derive(Debug)]
pub struct ControlSystemBuilder {
    id: SystemId,
    variables: SlotMap<VariableKey, VariableDef>,
    names: HashMap<String, VariableKey>,
    rules: Rules,
    inference: MamdaniInference,
}

impl Default for ControlSystemBuilder {
    fn default() -> Self {
        Self {
            id: SystemId::next(),
            variables: SlotMap::with_key(),
            names: HashMap::new(),
            rules: Rules::default(),
            inference: MamdaniInference::default(),
        }
    }
}

impl ControlSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, name: impl Into<String>, universe: Universe) -> Result<Variable<Input>> {
        self.add_variable(name.into(), universe)
    }

    pub fn add_output(&mut self, name: impl Into<String>, universe: Universe) -> Result<Variable<Output>> {
        self.add_variable(name.into(), universe)
    }

    fn add_variable<R: VariableRole>(&mut self, name: String, universe: Universe) -> Result<Variable<R>> {
        if self.names.contains_key(&name) {
            return Err(FuzzyError::DuplicateVariable(name));
        }

        let key = self.variables.insert(VariableDef::new(name.clone(), R::ROLE, universe));

        debug!(variable = %name, role = %R::ROLE, "registered variable");
        self.names.insert(name, key);

        Ok(Variable::new(key, self.id))
    }

    pub fn define_term<R: VariableRole>(
        &mut self,
        var: Variable<R>,
        term: impl Into<String>,
        membership: MembershipFunction,
    ) -> Result<()> {
        self.def_mut(var)?.define_term(term, membership)?;

        Ok(())
    }

    pub fn auto_partition<R: VariableRole>(&mut self, var: Variable<R>, n: usize) -> Result<()> {
        self.def_mut(var)?.auto_partition(n)
    }

    pub fn auto_partition_named<R: VariableRole, S: Into<String>>(
        &mut self,
        var: Variable<R>,
        names: impl IntoIterator<Item = S>,
    ) -> Result<()> {
        self.def_mut(var)?.auto_partition_named(names)
    }

    /// Premise leaf `var is term`.
    pub fn is(&self, var: Variable<Input>, term: &str) -> Result<Expr> {
        Ok(Expr::Is(self.term_ref(var, term)?))
    }

    /// Conclusion `var is term`.
    pub fn then(&self, var: Variable<Output>, term: &str) -> Result<Consequent> {
        Ok(Consequent(self.term_ref(var, term)?))
    }

    pub fn rule(&mut self, premise: Expr, consequents: impl IntoIterator<Item = Consequent>) -> Result<()> {
        self.add_rule(Rule::new(premise, consequents)?)
    }

    /// Adds a rule after checking that every reference points at a variable
    /// and term of this builder with the right role.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        for term_ref in rule.premise.propositions() {
            self.check_ref(term_ref, Role::Input)?;
        }
        for consequent in &rule.consequents {
            self.check_ref(consequent.0, Role::Output)?;
        }

        debug!(rule = self.rules.len(), consequents = rule.consequents.len(), "registered rule");
        self.rules.push(rule);

        Ok(())
    }

    pub fn inference(&mut self, inference: MamdaniInference) -> &mut Self {
        self.inference = inference;
        self
    }

    pub fn input(&self, name: &str) -> Result<Variable<Input>> {
        lookup::<Input>(&self.variables, &self.names, name).map(|key| Variable::new(key, self.id))
    }

    pub fn output(&self, name: &str) -> Result<Variable<Output>> {
        lookup::<Output>(&self.variables, &self.names, name).map(|key| Variable::new(key, self.id))
    }

    pub fn build(self) -> Result<ControlSystem> {
        let mut required_inputs = Vec::new();

        for rule in &self.rules {
            for term_ref in rule.premise.propositions() {
                if !required_inputs.contains(&term_ref.variable) {
                    required_inputs.push(term_ref.variable);
                }
            }
        }

        let mut samples = SecondaryMap::new();

        for (key, var) in &self.variables {
            if var.role == Role::Output {
                let points = var.universe.points();
                let sampled: Vec<Vec<f64>> = var.terms.iter().map(|term| term.membership.sample(points)).collect();

                samples.insert(key, sampled);
            }
        }

        debug!(
            variables = self.variables.len(),
            rules = self.rules.len(),
            required_inputs = required_inputs.len(),
            "built control system"
        );

        Ok(ControlSystem {
            id: self.id,
            variables: self.variables,
            names: self.names,
            rules: self.rules,
            inference: self.inference,
            required_inputs,
            samples,
        })
    }

    fn def_mut<R: VariableRole>(&mut self, var: Variable<R>) -> Result<&mut VariableDef> {
        if var.1 != self.id {
            return Err(FuzzyError::ForeignHandle(R::ROLE));
        }

        match self.variables.get_mut(var.0) {
            Some(def) if def.role == R::ROLE => Ok(def),
            Some(def) => Err(FuzzyError::UndefinedVariable {
                name: def.name.clone(),
                role: R::ROLE,
            }),
            None => Err(FuzzyError::ForeignHandle(R::ROLE)),
        }
    }

    fn term_ref<R: VariableRole>(&self, var: Variable<R>, term: &str) -> Result<TermRef> {
        let def = self.def(var.0, var.1, R::ROLE)?;

        Ok(TermRef {
            owner: self.id,
            variable: var.0,
            term: def.term_id(term)?,
        })
    }

    fn check_ref(&self, term_ref: TermRef, role: Role) -> Result<()> {
        let def = self.def(term_ref.variable, term_ref.owner, role)?;

        if term_ref.term.0 >= def.terms.len() {
            return Err(FuzzyError::UndefinedTerm {
                variable: def.name.clone(),
                term: format!("#{}", term_ref.term.0),
            });
        }

        Ok(())
    }

    // Resolves a handle issued by this builder, checking its role.
    fn def(&self, key: VariableKey, owner: SystemId, role: Role) -> Result<&VariableDef> {
        if owner != self.id {
            return Err(FuzzyError::ForeignHandle(role));
        }

        match self.variables.get(key) {
            Some(def) if def.role == role => Ok(def),
            Some(def) => Err(FuzzyError::UndefinedVariable {
                name: def.name.clone(),
                role,
            }),
            None => Err(FuzzyError::ForeignHandle(role)),
        }
    }
}

fn lookup<R: VariableRole>(
    variables: &SlotMap<VariableKey, VariableDef>,
    names: &HashMap<String, VariableKey>,
    name: &str,
) -> Result<VariableKey> {
    names
        .get(name)
        .copied()
        .filter(|key| variables[*key].role == R::ROLE)
        .ok_or_else(|| FuzzyError::UndefinedVariable {
            name: name.to_owned(),
            role: R::ROLE,
        })
}

/// An immutable set of variables and rules.
///
/// Build it once and share it: every evaluation gets its own `Simulation`,
/// so a `&ControlSystem` can be used from any number of threads at once.
#[derive(Debug)]
pub struct ControlSystem {
    pub(crate) id: SystemId,
    pub(crate) variables: SlotMap<VariableKey, VariableDef>,
    names: HashMap<String, VariableKey>,
    pub(crate) rules: Rules,
    pub(crate) inference: MamdaniInference,
    // Input variables referenced by at least one premise, first use first
    pub(crate) required_inputs: Vec<VariableKey>,
    // Every term of every output variable sampled over its universe
    pub(crate) samples: SecondaryMap<VariableKey, Vec<Vec<f64>>>,
}

impl ControlSystem {
    pub fn builder() -> ControlSystemBuilder {
        ControlSystemBuilder::new()
    }

    /// A fresh evaluation context bound to this system.
    pub fn simulation(&self) -> Simulation<'_> {
        Simulation::new(self)
    }

    /// Runs one inference pass over `inputs`.
    pub fn infer(&self, inputs: &Inputs) -> Result<Outputs> {
        self.inference.infer(self, inputs)
    }

    pub fn input(&self, name: &str) -> Result<Variable<Input>> {
        lookup::<Input>(&self.variables, &self.names, name).map(|key| Variable::new(key, self.id))
    }

    pub fn output(&self, name: &str) -> Result<Variable<Output>> {
        lookup::<Output>(&self.variables, &self.names, name).map(|key| Variable::new(key, self.id))
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDef> {
        self.names.get(name).map(|key| &self.variables[*key])
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.names_with_role(Role::Input)
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.names_with_role(Role::Output)
    }

    /// Inputs that must be set before `compute`, in order of first use.
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.required_inputs.iter().map(|key| self.variables[*key].name())
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn inference_settings(&self) -> &MamdaniInference {
        &self.inference
    }

    pub(crate) fn def(&self, key: VariableKey) -> &VariableDef {
        &self.variables[key]
    }

    pub(crate) fn get(&self, key: VariableKey) -> Option<&VariableDef> {
        self.variables.get(key)
    }

    /// The definition behind a handle, if this system issued it.
    pub(crate) fn resolve<R: VariableRole>(&self, var: Variable<R>) -> Option<&VariableDef> {
        if var.1 != self.id {
            return None;
        }

        self.variables.get(var.0).filter(|def| def.role == R::ROLE)
    }

    fn names_with_role(&self, role: Role) -> impl Iterator<Item = &str> {
        self.variables
            .values()
            .filter(move |var| var.role == role)
            .map(VariableDef::name)
    }
}

#[cfg(test)]
fn load_priority() -> (ControlSystemBuilder, Variable<Input>, Variable<Output>) {
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

    (builder, load, priority)
}

#[test]
fn test_names_are_unique_and_role_checked() {
    let (mut builder, _, _) = load_priority();

    assert_eq!(
        builder.add_output("load", Universe::with_step(0. ..=1., 1.).unwrap()).unwrap_err(),
        FuzzyError::DuplicateVariable("load".into())
    );
    assert!(builder.input("load").is_ok());
    assert_eq!(
        builder.output("load").unwrap_err(),
        FuzzyError::UndefinedVariable {
            name: "load".into(),
            role: Role::Output,
        }
    );
}

#[test]
fn test_unknown_terms_rejected_at_build_time() {
    let (builder, load, priority) = load_priority();

    assert_eq!(
        builder.is(load, "medium").unwrap_err(),
        FuzzyError::UndefinedTerm {
            variable: "load".into(),
            term: "medium".into(),
        }
    );
    assert!(matches!(builder.then(priority, "urgent"), Err(FuzzyError::UndefinedTerm { .. })));
}

#[test]
fn test_build_collects_required_inputs() {
    let (mut builder, load, priority) = load_priority();
    let spare = builder
        .add_input("spare", Universe::with_step(0. ..=1., 0.5).unwrap())
        .unwrap();

    builder.auto_partition(spare, 2).unwrap();

    let premise = builder.is(load, "heavy").unwrap();
    let consequent = builder.then(priority, "high").unwrap();

    builder.rule(premise, [consequent]).unwrap();

    let system = builder.build().unwrap();

    assert_eq!(system.required_inputs().collect::<Vec<_>>(), ["load"]);
    assert_eq!(system.input_names().count(), 2);
    assert_eq!(system.output_names().collect::<Vec<_>>(), ["priority"]);
    assert_eq!(system.rules().len(), 1);
}

#[test]
fn test_handles_from_another_builder_rejected() {
    let (mut builder, load, priority) = load_priority();
    let (other, other_load, other_priority) = load_priority();

    assert_eq!(
        builder.is(other_load, "heavy").unwrap_err(),
        FuzzyError::ForeignHandle(Role::Input)
    );
    assert_eq!(
        builder.then(other_priority, "high").unwrap_err(),
        FuzzyError::ForeignHandle(Role::Output)
    );
    assert_eq!(
        builder.define_term(other_load, "mid", MembershipFunction::triangular(25., 50., 75.).unwrap()),
        Err(FuzzyError::ForeignHandle(Role::Input))
    );

    let heavy = builder.is(load, "heavy").unwrap();
    let high = builder.then(priority, "high").unwrap();
    let foreign_premise = other.is(other_load, "heavy").unwrap();
    let foreign_high = other.then(other_priority, "high").unwrap();

    assert_eq!(
        builder.rule(foreign_premise, [high]),
        Err(FuzzyError::ForeignHandle(Role::Input))
    );
    assert_eq!(
        builder.rule(heavy.clone(), [foreign_high]),
        Err(FuzzyError::ForeignHandle(Role::Output))
    );

    builder.rule(heavy, [high]).unwrap();

    assert_eq!(builder.build().unwrap().rules().len(), 1);
}
