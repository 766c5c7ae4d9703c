//! Business rule definitions and evaluation

mod assertion;
pub mod brex;
mod builtin;

pub use assertion::Assertion;
pub use brex::ExtractError;
pub use builtin::default_rules;

use crate::parser::Node;
use crate::path::{PathError, PathExpr};
use crate::Severity;
use chrono::NaiveDate;
use serde::Serialize;

/// A business rule: a context path, a severity and a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Rule identifier, empty if the rule document gave none
    pub id: String,
    pub severity: Severity,
    /// Context path designating the constrained node
    pub context: String,
    /// User-facing message
    pub message: String,
    /// Condition the matched value must satisfy. Without one the match
    /// itself is the violation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<Assertion>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            context: context.into(),
            message: message.into(),
            assertion: None,
        }
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertion = Some(assertion);
        self
    }

    /// Rules with an empty context are never evaluated
    pub fn is_evaluable(&self) -> bool {
        !self.context.trim().is_empty()
    }

    /// Evaluate the rule against a tree
    ///
    /// Returns the violation location if the rule fires, `None` if the path
    /// does not match or the assertion holds.
    pub fn check(&self, tree: &Node, today: NaiveDate) -> Result<Option<String>, PathError> {
        if !self.is_evaluable() {
            return Ok(None);
        }

        let expr = PathExpr::parse(&self.context)?;
        // With an assertion, a missing attribute is a failed assertion
        let found = match self.assertion {
            Some(_) => expr.find_element_match(tree),
            None => expr.find_match(tree),
        };
        let Some(found) = found else {
            return Ok(None);
        };

        match &self.assertion {
            Some(assertion) if assertion.holds(&found, today) => Ok(None),
            _ => Ok(Some(found.location)),
        }
    }
}

/// An immutable, ordered collection of rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in default rules
    pub fn builtin() -> Self {
        Self::new(default_rules())
    }

    /// Extract rules from a rule-authoring (BREX) document
    pub fn from_brex(text: &str) -> Result<Self, ExtractError> {
        brex::extract(text).map(Self::new)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find a rule by id
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
