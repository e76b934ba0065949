//! Declarative control system definitions.
//!
//! A system can be described in TOML instead of being assembled through
//! `ControlSystemBuilder`:
//!
//! ```toml
//! [inference]
//! defuzz_op = "centroid"
//!
//! [[variables]]
//! name = "load"
//! role = "input"
//! universe = { start = 0.0, stop = 100.0, step = 1.0 }
//! terms = [
//!     { name = "light", trimf = [0.0, 0.0, 50.0] },
//!     { name = "heavy", trimf = [50.0, 100.0, 100.0] },
//! ]
//!
//! [[variables]]
//! name = "priority"
//! role = "output"
//! universe = { start = 0.0, stop = 10.0, step = 1.0 }
//! auto = ["low", "high"]
//!
//! [[rules]]
//! if = { is = ["load", "heavy"] }
//! then = [["priority", "high"]]
//! ```
//!
//! Premises are trees of `is`, `and`, `or` and `not` tables; `and` and `or`
//! take any number of operands.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsl::Expr;
use crate::error::{FuzzyError, Result};
use crate::inference::MamdaniInference;
use crate::rules::Rule;
use crate::system::{ControlSystem, ControlSystemBuilder};
use crate::terms::MembershipFunction;
use crate::universe::Universe;
use crate::variable::{Role, Variable, VariableRole};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    #[serde(default)]
    pub inference: MamdaniInference,
    pub variables: Vec<VariableConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableConfig {
    pub name: String,
    pub role: Role,
    pub universe: UniverseConfig,
    #[serde(default)]
    pub terms: Vec<TermConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<AutoPartition>,
}

impl VariableConfig {
    fn define_terms<R: VariableRole>(&self, builder: &mut ControlSystemBuilder, handle: Variable<R>) -> Result<()> {
        for term in &self.terms {
            builder.define_term(handle, &term.name, term.shape.build()?)?;
        }

        match &self.auto {
            Some(AutoPartition::Count(n)) => builder.auto_partition(handle, *n),
            Some(AutoPartition::Names(names)) => builder.auto_partition_named(handle, names),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniverseConfig {
    Points { points: Vec<f64> },
    Step { start: f64, stop: f64, step: f64 },
    Linspace { start: f64, stop: f64, samples: usize },
}

impl UniverseConfig {
    pub fn build(&self) -> Result<Universe> {
        match self {
            Self::Points { points } => Universe::from_points(points.clone()),
            Self::Step { start, stop, step } => Universe::with_step(*start..=*stop, *step),
            Self::Linspace { start, stop, samples } => Universe::linspace(*start..=*stop, *samples),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermConfig {
    pub name: String,
    #[serde(flatten)]
    pub shape: ShapeConfig,
}

/// Membership parameters in the usual `trimf` / `trapmf` / `gaussmf` order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeConfig {
    Trimf([f64; 3]),
    Trapmf([f64; 4]),
    Gaussmf([f64; 2]),
}

impl ShapeConfig {
    pub fn build(&self) -> Result<MembershipFunction> {
        match *self {
            Self::Trimf([a, b, c]) => MembershipFunction::triangular(a, b, c),
            Self::Trapmf([a, b, c, d]) => MembershipFunction::trapezoidal(a, b, c, d),
            Self::Gaussmf([mean, sigma]) => MembershipFunction::gaussian(mean, sigma),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AutoPartition {
    Count(usize),
    Names(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(rename = "if")]
    pub premise: ExprConfig,
    pub then: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprConfig {
    Is(String, String),
    And(Vec<ExprConfig>),
    Or(Vec<ExprConfig>),
    Not(Box<ExprConfig>),
}

impl ExprConfig {
    fn build(&self, builder: &ControlSystemBuilder) -> Result<Expr> {
        match self {
            Self::Is(variable, term) => builder.is(builder.input(variable)?, term),
            Self::And(operands) => fold(operands, builder, "and", Expr::and),
            Self::Or(operands) => fold(operands, builder, "or", Expr::or),
            Self::Not(inner) => Ok(!inner.build(builder)?),
        }
    }
}

fn fold(
    operands: &[ExprConfig],
    builder: &ControlSystemBuilder,
    op: &str,
    combine: fn(Expr, Expr) -> Expr,
) -> Result<Expr> {
    let mut exprs = operands.iter().map(|operand| operand.build(builder));
    let first = exprs
        .next()
        .ok_or_else(|| FuzzyError::Config(format!("`{op}` needs at least one operand")))??;

    exprs.try_fold(first, |acc, next| -> Result<Expr> { Ok(combine(acc, next?)) })
}

impl SystemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|err| FuzzyError::Config(format!("{}: {err}", path.display())))?;

        Self::from_toml_str(&content)
    }

    pub fn build(&self) -> Result<ControlSystem> {
        let mut builder = ControlSystem::builder();

        for var in &self.variables {
            let universe = var.universe.build()?;

            match var.role {
                Role::Input => {
                    let handle = builder.add_input(&var.name, universe)?;

                    var.define_terms(&mut builder, handle)?;
                },
                Role::Output => {
                    let handle = builder.add_output(&var.name, universe)?;

                    var.define_terms(&mut builder, handle)?;
                },
            }
        }

        for rule in &self.rules {
            let premise = rule.premise.build(&builder)?;
            let consequents = rule
                .then
                .iter()
                .map(|(variable, term)| builder.then(builder.output(variable)?, term))
                .collect::<Result<Vec<_>>>()?;
            let mut built = Rule::new(premise, consequents)?;

            if let Some(weight) = rule.weight {
                built = built.with_weight(weight)?;
            }

            builder.add_rule(built)?;
        }

        debug!(variables = self.variables.len(), rules = self.rules.len(), "loaded system definition");
        builder.inference(self.inference);
        builder.build()
    }
}

impl ControlSystem {
    /// Parses and builds a system from a TOML definition.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        SystemConfig::from_toml_str(content)?.build()
    }
}

#[cfg(test)]
const LOAD_PRIORITY: &str = r#"
[inference]
defuzz_op = "centroid"

[[variables]]
name = "load"
role = "input"
universe = { start = 0.0, stop = 100.0, step = 1.0 }
terms = [
    { name = "light", trimf = [0.0, 0.0, 50.0] },
    { name = "heavy", trimf = [50.0, 100.0, 100.0] },
]

[[variables]]
name = "priority"
role = "output"
universe = { start = 0.0, stop = 10.0, step = 1.0 }
terms = [
    { name = "low", trimf = [0.0, 0.0, 5.0] },
    { name = "high", trimf = [5.0, 10.0, 10.0] },
]

[[rules]]
if = { is = ["load", "heavy"] }
then = [["priority", "high"]]
"#;

#[test]
fn test_load_priority_from_toml() {
    let system = ControlSystem::from_toml_str(LOAD_PRIORITY).unwrap();
    let mut sim = system.simulation();

    sim.set_input("load", 80.).unwrap();
    sim.compute().unwrap();

    let expected = (6. * 0.2 + 7. * 0.4 + 27. * 0.6) / 2.4;

    assert!((sim.get_output("priority").unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_nary_and_not_and_auto() {
    let system = ControlSystem::from_toml_str(
        r#"
        [inference]
        and_op = "prod"

        [[variables]]
        name = "a"
        role = "input"
        universe = { points = [0.0, 0.25, 0.5, 0.75, 1.0] }
        auto = 2

        [[variables]]
        name = "b"
        role = "input"
        universe = { start = 0.0, stop = 1.0, samples = 5 }
        auto = ["lo", "hi"]

        [[variables]]
        name = "out"
        role = "output"
        universe = { start = 0.0, stop = 4.0, step = 1.0 }
        terms = [{ name = "mid", trapmf = [1.0, 2.0, 2.0, 3.0] }]

        [[rules]]
        if = { and = [{ is = ["a", "term2"] }, { not = { is = ["b", "lo"] } }, { or = [{ is = ["b", "hi"] }] }] }
        then = [["out", "mid"]]
        weight = 0.5
        "#,
    )
    .unwrap();

    assert_eq!(system.inference_settings().and_op, crate::ops::AndOp::Prod);

    let mut sim = system.simulation();

    sim.set_input("a", 1.).unwrap();
    sim.set_input("b", 0.75).unwrap();
    sim.compute().unwrap();

    // 1 * (1 - 0.25) * 0.75, halved by the weight
    assert_eq!(sim.firing_strengths().unwrap(), &[0.28125]);
    assert!((sim.get_output("out").unwrap() - 2.).abs() < 1e-12);
}

#[test]
fn test_config_errors() {
    assert!(matches!(
        ControlSystem::from_toml_str("variables = 3"),
        Err(FuzzyError::Config(_))
    ));

    let bad_triangle = r#"
        [[variables]]
        name = "x"
        role = "input"
        universe = { start = 0.0, stop = 1.0, step = 0.5 }
        terms = [{ name = "t", trimf = [1.0, 0.0, 0.5] }]
    "#;

    assert!(matches!(
        ControlSystem::from_toml_str(bad_triangle),
        Err(FuzzyError::InvalidMembership(_))
    ));

    let wrong_role = r#"
        [[variables]]
        name = "x"
        role = "input"
        universe = { start = 0.0, stop = 2.0, step = 1.0 }
        auto = 2

        [[rules]]
        if = { is = ["x", "term1"] }
        then = [["x", "term2"]]
    "#;

    assert_eq!(
        ControlSystem::from_toml_str(wrong_role).unwrap_err(),
        FuzzyError::UndefinedVariable {
            name: "x".into(),
            role: Role::Output,
        }
    );

    let empty_and = r#"
        [[variables]]
        name = "x"
        role = "output"
        universe = { start = 0.0, stop = 2.0, step = 1.0 }
        auto = 2

        [[rules]]
        if = { and = [] }
        then = [["x", "term1"]]
    "#;

    assert!(matches!(ControlSystem::from_toml_str(empty_and), Err(FuzzyError::Config(_))));

    let huge_universe = r#"
        [[variables]]
        name = "x"
        role = "input"
        universe = { start = 0.0, stop = 1e20, step = 1.0 }
    "#;

    assert!(matches!(
        ControlSystem::from_toml_str(huge_universe),
        Err(FuzzyError::InvalidUniverse(_))
    ));
}
