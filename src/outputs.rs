use slotmap::SecondaryMap;

use crate::variable::{Output, SystemId, Variable, VariableKey};

/// Inference result for one output variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Inferred {
    /// Aggregated membership, aligned with the variable's universe
    pub aggregated: Vec<f64>,
    pub crisp: f64,
    /// Set when the aggregated set was zero everywhere and `crisp` is the
    /// universe midpoint rather than a defuzzified value
    pub fell_back: bool,
}

/// Everything one inference pass produced.
#[derive(Clone, Debug)]
pub struct Outputs {
    owner: SystemId,
    pub(crate) inferred: SecondaryMap<VariableKey, Inferred>,
    pub(crate) firing_strengths: Vec<f64>,
}

impl Outputs {
    pub(crate) fn new(
        owner: SystemId,
        inferred: SecondaryMap<VariableKey, Inferred>,
        firing_strengths: Vec<f64>,
    ) -> Self {
        Self {
            owner,
            inferred,
            firing_strengths,
        }
    }

    /// `None` for a handle issued by a different system.
    pub fn crisp(&self, var: Variable<Output>) -> Option<f64> {
        self.inferred(var).map(|inferred| inferred.crisp)
    }

    pub fn inferred(&self, var: Variable<Output>) -> Option<&Inferred> {
        if var.1 != self.owner {
            return None;
        }

        self.inferred.get(var.0)
    }

    /// Firing strength of every rule, in rule order.
    pub fn firing_strengths(&self) -> &[f64] {
        &self.firing_strengths
    }

    pub(crate) fn by_key(&self, key: VariableKey) -> Option<&Inferred> {
        self.inferred.get(key)
    }
}
