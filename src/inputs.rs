use slotmap::SecondaryMap;

use crate::error::{FuzzyError, Result};
use crate::variable::{Input, Role, SystemId, Variable, VariableKey};

/// Crisp values supplied for input variables, keyed by variable.
#[derive(Clone, Debug, Default)]
pub struct Inputs {
    pub(crate) values: SecondaryMap<VariableKey, f64>,
    // System whose handles were passed to `add`
    owner: Option<SystemId>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `ForeignHandle` when `var` was issued by a different
    /// system than the handles already added.
    pub fn add(&mut self, var: Variable<Input>, val: f64) -> Result<()> {
        match self.owner {
            Some(owner) if owner != var.1 => return Err(FuzzyError::ForeignHandle(Role::Input)),
            _ => self.owner = Some(var.1),
        }

        self.values.insert(var.0, val);

        Ok(())
    }

    pub fn get(&self, var: Variable<Input>) -> Option<f64> {
        self.owner
            .filter(|owner| *owner == var.1)
            .and_then(|_| self.values.get(var.0).copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn owner(&self) -> Option<SystemId> {
        self.owner
    }

    pub(crate) fn insert(&mut self, key: VariableKey, val: f64) {
        self.values.insert(key, val);
    }

    pub(crate) fn value(&self, key: VariableKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}
