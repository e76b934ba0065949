use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::error::{FuzzyError, Result};
use crate::linspace::Linspace;
use crate::terms::{partition_labels, MembershipFunction, Term, TermId};
use crate::universe::Universe;

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

/// Counter behind `SystemId`; every builder takes the next value.
static SYSTEM_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifies the builder, and later the system, that issued a handle.
///
/// Slot keys restart for every builder, so a key alone cannot tell two
/// systems' variables apart.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct SystemId(u64);

impl SystemId {
    pub(crate) fn next() -> Self {
        SystemId(SYSTEM_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a variable is supplied by the caller or produced by inference.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Input,
    Output,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Input => f.write_str("input"),
            Role::Output => f.write_str("output"),
        }
    }
}

/// Marker for antecedent variables.
#[derive(Debug)]
pub enum Input {}

/// Marker for consequent variables.
#[derive(Debug)]
pub enum Output {}

pub trait VariableRole {
    const ROLE: Role;
}

impl VariableRole for Input {
    const ROLE: Role = Role::Input;
}

impl VariableRole for Output {
    const ROLE: Role = Role::Output;
}

/// Typed handle to a variable registered on a `ControlSystemBuilder`.
///
/// The role parameter keeps output variables out of rule premises and input
/// variables out of rule conclusions at compile time.
pub struct Variable<R>(pub(crate) VariableKey, pub(crate) SystemId, PhantomData<R>);

impl<R> Variable<R> {
    pub(crate) fn new(key: VariableKey, owner: SystemId) -> Self {
        Variable(key, owner, PhantomData)
    }

    pub fn key(self) -> VariableKey {
        self.0
    }
}

impl<R> Clone for Variable<R> {
    fn clone(&self) -> Self {
        Variable(self.0, self.1, PhantomData)
    }
}

impl<R> Copy for Variable<R> {}

impl<R> fmt::Debug for Variable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Variable").field(&self.0).field(&self.1).finish()
    }
}

/// A named universe of discourse and the terms defined over it.
#[derive(Clone, Debug)]
pub struct VariableDef {
    pub(crate) name: String,
    pub(crate) role: Role,
    pub(crate) universe: Universe,
    pub(crate) terms: Vec<Term>,
    term_ids: HashMap<String, TermId>,
}

impl VariableDef {
    pub(crate) fn new(name: impl Into<String>, role: Role, universe: Universe) -> Self {
        Self {
            name: name.into(),
            role,
            universe,
            terms: Vec::new(),
            term_ids: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.0]
    }

    pub fn term_id(&self, term: &str) -> Result<TermId> {
        self.term_ids
            .get(term)
            .copied()
            .ok_or_else(|| FuzzyError::UndefinedTerm {
                variable: self.name.clone(),
                term: term.to_owned(),
            })
    }

    pub fn define_term(&mut self, name: impl Into<String>, membership: MembershipFunction) -> Result<TermId> {
        let name = name.into();
        let membership = membership.validate()?;

        if self.term_ids.contains_key(&name) {
            return Err(FuzzyError::DuplicateTerm {
                variable: self.name.clone(),
                term: name,
            });
        }

        let id = TermId(self.terms.len());

        self.term_ids.insert(name.clone(), id);
        self.terms.push(Term { name, membership });

        Ok(id)
    }

    /// Covers the universe with `n` evenly spaced triangles using the
    /// default labels ("poor", "average", "good" for `n = 3`).
    pub fn auto_partition(&mut self, n: usize) -> Result<()> {
        self.auto_partition_named(partition_labels(n))
    }

    /// Like `auto_partition`, with one label per generated term.
    ///
    /// Neighbouring terms cross at 0.5 halfway between their peaks and the
    /// degrees of all terms sum to 1 at every point of the universe.
    pub fn auto_partition_named<S: Into<String>>(&mut self, names: impl IntoIterator<Item = S>) -> Result<()> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let n = names.len();

        if n < 2 {
            return Err(FuzzyError::InvalidPartition {
                terms: n,
                reason: "at least two terms are required",
            });
        }
        if self.universe.len() < n + 1 {
            return Err(FuzzyError::InvalidPartition {
                terms: n,
                reason: "the universe has too few points",
            });
        }
        if let Some(taken) = names
            .iter()
            .enumerate()
            .find(|(i, name)| self.term_ids.contains_key(*name) || names[..*i].contains(*name))
            .map(|(_, name)| name)
        {
            return Err(FuzzyError::DuplicateTerm {
                variable: self.name.clone(),
                term: taken.clone(),
            });
        }

        let (min, max) = (self.universe.min(), self.universe.max());
        let half_width = (max - min) / (n - 1) as f64;

        for (name, center) in names.into_iter().zip(Linspace::new(min, max, n)) {
            let membership = MembershipFunction::triangular(center - half_width, center, center + half_width)?;

            self.define_term(name, membership)?;
        }

        Ok(())
    }

    /// Degree of `x` in every term, in definition order.
    pub fn fuzzify(&self, x: f64) -> Vec<f64> {
        self.terms.iter().map(|term| term.membership.degree(x)).collect()
    }
}

#[cfg(test)]
fn input(min: f64, max: f64) -> VariableDef {
    VariableDef::new("x", Role::Input, Universe::with_step(min..=max, 1.).unwrap())
}

#[test]
fn test_define_term_rejects_duplicates() {
    let mut var = input(0., 10.);

    var.define_term("low", MembershipFunction::triangular(0., 0., 5.).unwrap())
        .unwrap();

    assert_eq!(
        var.define_term("low", MembershipFunction::triangular(0., 5., 10.).unwrap()),
        Err(FuzzyError::DuplicateTerm {
            variable: "x".into(),
            term: "low".into(),
        })
    );
    assert_eq!(var.terms().len(), 1);
}

#[test]
fn test_define_term_validates_struct_literals() {
    let mut var = input(0., 10.);

    assert!(matches!(
        var.define_term("bad", MembershipFunction::Triangular { a: 9., b: 1., c: 10. }),
        Err(FuzzyError::InvalidMembership(_))
    ));
}

#[test]
fn test_auto_partition_three() {
    let mut var = input(0., 10.);

    var.auto_partition(3).unwrap();

    let names: Vec<_> = var.terms().iter().map(Term::name).collect();

    assert_eq!(names, ["poor", "average", "good"]);

    let poor = var.term(var.term_id("poor").unwrap()).membership();
    let average = var.term(var.term_id("average").unwrap()).membership();
    let good = var.term(var.term_id("good").unwrap()).membership();

    assert_eq!(poor.degree(0.), 1.);
    assert_eq!(average.degree(5.), 1.);
    assert_eq!(good.degree(10.), 1.);
    assert_eq!(poor.degree(2.5), 0.5);
    assert_eq!(average.degree(2.5), 0.5);
    assert_eq!(average.degree(7.5), 0.5);
    assert_eq!(good.degree(7.5), 0.5);

    for x in [0., 1.3, 2.5, 5., 6.1, 9.9, 10.] {
        let total: f64 = var.fuzzify(x).iter().sum();

        assert!((total - 1.).abs() < 1e-12, "sum at {x} was {total}");
    }
}

#[test]
fn test_auto_partition_failures() {
    let mut var = input(0., 10.);

    assert!(matches!(var.auto_partition(1), Err(FuzzyError::InvalidPartition { terms: 1, .. })));

    let mut narrow = input(0., 2.);

    assert!(matches!(narrow.auto_partition(3), Err(FuzzyError::InvalidPartition { terms: 3, .. })));

    var.define_term("average", MembershipFunction::triangular(0., 5., 10.).unwrap())
        .unwrap();

    assert!(matches!(var.auto_partition(3), Err(FuzzyError::DuplicateTerm { .. })));
    assert!(matches!(
        input(0., 10.).auto_partition_named(["a", "b", "a"]),
        Err(FuzzyError::DuplicateTerm { .. })
    ));
}
