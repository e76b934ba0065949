use crate::dsl::{Expr, TermRef};
use crate::error::{FuzzyError, Result};
use crate::terms::TermId;
use crate::variable::VariableKey;
#[cfg(test)]
use crate::variable::SystemId;

/// One `(output variable, term)` assignment of a rule conclusion.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Consequent(pub(crate) TermRef);

impl Consequent {
    pub fn variable(&self) -> VariableKey {
        self.0.variable
    }

    pub fn term(&self) -> TermId {
        self.0.term
    }
}

/// `if premise then consequents`, with the firing strength scaled by `weight`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub(crate) premise: Expr,
    pub(crate) consequents: Vec<Consequent>,
    pub(crate) weight: f64,
}

impl Rule {
    pub fn new(premise: Expr, consequents: impl IntoIterator<Item = Consequent>) -> Result<Self> {
        let mut deduped: Vec<Consequent> = Vec::new();

        for consequent in consequents {
            if !deduped.contains(&consequent) {
                deduped.push(consequent);
            }
        }

        if deduped.is_empty() {
            return Err(FuzzyError::EmptyConsequent);
        }

        Ok(Rule {
            premise,
            consequents: deduped,
            weight: 1.,
        })
    }

    pub fn with_weight(mut self, weight: f64) -> Result<Self> {
        if !(0. ..=1.).contains(&weight) {
            return Err(FuzzyError::InvalidRuleWeight(weight));
        }

        self.weight = weight;

        Ok(self)
    }

    pub fn premise(&self) -> &Expr {
        &self.premise
    }

    pub fn consequents(&self) -> &[Consequent] {
        &self.consequents
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// The rules of a system in registration order; only the builder adds to it.
#[derive(Clone, Debug, Default)]
pub struct Rules(pub(crate) Vec<Rule>);

impl Rules {
    pub(crate) fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }
}

impl<'r> IntoIterator for &'r Rules {
    type Item = &'r Rule;
    type IntoIter = std::slice::Iter<'r, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
fn term_ref(term: usize) -> TermRef {
    use slotmap::SlotMap;

    let variable = SlotMap::<VariableKey, ()>::with_key().insert(());

    TermRef {
        owner: SystemId::next(),
        variable,
        term: TermId(term),
    }
}

#[test]
fn test_rule_needs_consequent() {
    let premise = Expr::Is(term_ref(0));

    assert_eq!(Rule::new(premise, Vec::new()), Err(FuzzyError::EmptyConsequent));
}

#[test]
fn test_rule_dedupes_consequents() {
    let high = Consequent(term_ref(1));
    let rule = Rule::new(Expr::Is(term_ref(0)), [high, high]).unwrap();

    assert_eq!(rule.consequents(), &[high]);
    assert_eq!(rule.weight(), 1.);
}

#[test]
fn test_rule_weight_bounds() {
    let rule = Rule::new(Expr::Is(term_ref(0)), [Consequent(term_ref(1))]).unwrap();

    assert_eq!(rule.clone().with_weight(0.5).unwrap().weight(), 0.5);
    assert_eq!(rule.with_weight(1.5), Err(FuzzyError::InvalidRuleWeight(1.5)));
}
