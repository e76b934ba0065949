use std::ops::{BitAnd, BitOr, Not};

use crate::error::Result;
use crate::ops::{AndOp, OrOp};
use crate::terms::TermId;
use crate::variable::{SystemId, VariableKey};

/// A reference to one term of one variable, e.g. `load is heavy`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TermRef {
    pub(crate) owner: SystemId,
    pub(crate) variable: VariableKey,
    pub(crate) term: TermId,
}

impl TermRef {
    pub fn variable(&self) -> VariableKey {
        self.variable
    }

    pub fn term(&self) -> TermId {
        self.term
    }
}

/// A rule premise: term references combined with AND / OR / NOT.
///
/// Build leaves with `ControlSystemBuilder::is` and combine them with the
/// methods below or with `&`, `|` and `!`.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Is(TermRef),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn and(self, rhs: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(rhs))
    }

    /// Every term reference in the tree, left to right.
    pub fn propositions(&self) -> Vec<TermRef> {
        let mut props = Vec::new();

        fn parse(expr: &Expr, out: &mut Vec<TermRef>) {
            match expr {
                Expr::Is(term_ref) => out.push(*term_ref),
                Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                    parse(lhs, out);
                    parse(rhs, out);
                },
                Expr::Not(inner) => parse(inner, out),
            }
        }

        parse(self, &mut props);

        props
    }

    /// Firing strength of the expression.
    ///
    /// `degree` resolves a leaf to its fuzzified degree and is expected to
    /// fail with `UndefinedTerm` when no degree was computed for it.
    pub fn evaluate<D>(&self, degree: &D, and_op: AndOp, or_op: OrOp) -> Result<f64>
    where
        D: Fn(TermRef) -> Result<f64>,
    {
        match self {
            Expr::Is(term_ref) => degree(*term_ref),
            Expr::And(lhs, rhs) => {
                let left = lhs.evaluate(degree, and_op, or_op)?;
                let right = rhs.evaluate(degree, and_op, or_op)?;

                Ok(and_op.apply(left, right))
            },
            Expr::Or(lhs, rhs) => {
                let left = lhs.evaluate(degree, and_op, or_op)?;
                let right = rhs.evaluate(degree, and_op, or_op)?;

                Ok(or_op.apply(left, right))
            },
            Expr::Not(inner) => Ok(1. - inner.evaluate(degree, and_op, or_op)?),
        }
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

#[cfg(test)]
mod fixtures {
    use std::collections::HashMap;

    use slotmap::SlotMap;

    use super::*;
    use crate::error::FuzzyError;

    pub(super) struct Leaves {
        pub(super) degrees: HashMap<TermRef, f64>,
        pub(super) refs: Vec<TermRef>,
    }

    pub(super) fn leaves(values: &[f64]) -> Leaves {
        let mut keys = SlotMap::<VariableKey, ()>::with_key();
        let variable = keys.insert(());
        let owner = SystemId::next();
        let refs: Vec<_> = (0..values.len())
            .map(|i| TermRef {
                owner,
                variable,
                term: TermId(i),
            })
            .collect();
        let degrees = refs.iter().copied().zip(values.iter().copied()).collect();

        Leaves { degrees, refs }
    }

    impl Leaves {
        pub(super) fn eval(&self, expr: &Expr) -> Result<f64> {
            let lookup = |term_ref: TermRef| {
                self.degrees
                    .get(&term_ref)
                    .copied()
                    .ok_or_else(|| FuzzyError::UndefinedTerm {
                        variable: "x".into(),
                        term: format!("{}", term_ref.term.0),
                    })
            };

            expr.evaluate(&lookup, AndOp::Min, OrOp::Max)
        }

        pub(super) fn leaf(&self, i: usize) -> Expr {
            Expr::Is(self.refs[i])
        }
    }
}

#[test]
fn test_and_or_not() {
    let leaves = fixtures::leaves(&[0.2, 0.7, 0.5]);
    let (a, b, c) = (leaves.leaf(0), leaves.leaf(1), leaves.leaf(2));

    assert_eq!(leaves.eval(&a.clone().and(b.clone())).unwrap(), 0.2);
    assert_eq!(leaves.eval(&(a.clone() | b.clone())).unwrap(), 0.7);
    assert_eq!(leaves.eval(&!b.clone()).unwrap(), 1. - 0.7);
    assert_eq!(leaves.eval(&((a.clone() | b.clone()) & c.clone())).unwrap(), 0.5);
    assert_eq!(leaves.eval(&(a & !c)).unwrap(), 0.2);
}

#[test]
fn test_missing_degree_is_undefined_term() {
    let leaves = fixtures::leaves(&[0.4]);
    let dangling = Expr::Is(TermRef {
        owner: leaves.refs[0].owner,
        variable: leaves.refs[0].variable,
        term: TermId(7),
    });

    assert!(matches!(
        leaves.eval(&leaves.leaf(0).or(dangling)),
        Err(crate::error::FuzzyError::UndefinedTerm { .. })
    ));
}

#[test]
fn test_propositions_in_order() {
    let leaves = fixtures::leaves(&[0., 0., 0.]);
    let expr = leaves.leaf(2) & !(leaves.leaf(0) | leaves.leaf(1));

    assert_eq!(expr.propositions(), vec![leaves.refs[2], leaves.refs[0], leaves.refs[1]]);
}
