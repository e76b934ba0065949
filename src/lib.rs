//! Mamdani fuzzy inference for assigning a discrete resource from a handful
//! of crisp readings.
//!
//! Build a [`ControlSystem`] once, either with [`ControlSystemBuilder`] or from
//! a TOML definition (see [`config`]), then run every evaluation through its
//! own [`Simulation`]:
//!
//! 1. each input is fuzzified against its variable's terms,
//! 2. every rule premise is evaluated to a firing strength,
//! 3. consequent terms are clipped by that strength and combined per output
//!    by pointwise max,
//! 4. each aggregated set is defuzzified to one crisp value (centroid by
//!    default; an output no rule fired for reports its universe midpoint).

pub mod config;
mod dsl;
pub mod elevator;
mod error;
mod inference;
mod inputs;
mod linspace;
mod math;
pub mod ops;
mod outputs;
mod rules;
mod simulation;
mod system;
mod terms;
mod universe;
mod variable;

pub use config::SystemConfig;
pub use dsl::{Expr, TermRef};
pub use error::{FuzzyError, Result};
pub use inference::{Fuzzified, MamdaniInference};
pub use inputs::Inputs;
pub use linspace::Linspace;
pub use ops::{AggregationOp, AndOp, DefuzzificationOp, ImplicationOp, OrOp};
pub use outputs::{Inferred, Outputs};
pub use rules::{Consequent, Rule, Rules};
pub use simulation::{Simulation, SimulationState};
pub use system::{ControlSystem, ControlSystemBuilder};
pub use terms::{MembershipFunction, Term, TermId};
pub use universe::Universe;
pub use variable::{Input, Output, Role, Variable, VariableDef, VariableKey, VariableRole};
