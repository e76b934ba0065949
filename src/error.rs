use thiserror::Error;

use crate::variable::Role;

pub type Result<T> = std::result::Result<T, FuzzyError>;

/// Everything that can go wrong while building or evaluating a control system.
///
/// Build-time mistakes (bad universes, malformed membership functions,
/// duplicate names) are reported by the builder so a `ControlSystem` that
/// exists is always well formed. Evaluation-time errors are local to the
/// `Simulation` call that produced them.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FuzzyError {
    #[error("term `{term}` is already defined on variable `{variable}`")]
    DuplicateTerm { variable: String, term: String },

    #[error("variable `{0}` is already defined")]
    DuplicateVariable(String),

    #[error("cannot partition into {terms} terms: {reason}")]
    InvalidPartition { terms: usize, reason: &'static str },

    #[error("invalid universe: {0}")]
    InvalidUniverse(&'static str),

    #[error("invalid membership function: {0}")]
    InvalidMembership(String),

    #[error("`{name}` is not an {role} variable")]
    UndefinedVariable { name: String, role: Role },

    /// A `Variable` or term reference issued by a different builder.
    #[error("{0} handle belongs to a different control system")]
    ForeignHandle(Role),

    #[error("term `{term}` is not defined on variable `{variable}`")]
    UndefinedTerm { variable: String, term: String },

    #[error("no crisp value has been set for input `{0}`")]
    MissingInput(String),

    #[error("input `{name}` must be a finite number")]
    InvalidInput { name: String },

    #[error("outputs are only available after compute()")]
    NotComputed,

    /// Raised by defuzzification when the aggregated set is zero everywhere.
    /// The simulation resolves it to the universe midpoint, so callers of
    /// `Simulation` never observe it.
    #[error("aggregated membership of `{0}` is zero everywhere")]
    DegenerateAggregate(String),

    #[error("a rule needs at least one consequent")]
    EmptyConsequent,

    #[error("rule weight {0} is outside [0, 1]")]
    InvalidRuleWeight(f64),

    #[error("invalid system definition: {0}")]
    Config(String),
}

impl From<toml::de::Error> for FuzzyError {
    fn from(err: toml::de::Error) -> Self {
        FuzzyError::Config(err.to_string())
    }
}
