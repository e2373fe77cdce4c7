//! Ordered, first-match-wins severity rule tables.
//!
//! Every classifier's CASE/WHEN cascade is declared as a table of
//! `(name, predicate, severity, action)` rows evaluated in declaration
//! order. That keeps non-obvious priorities — like the credit-risk
//! compound condition outranking the plain day thresholds — auditable and
//! testable as data rather than buried in `if` chains. The table carries a
//! mandatory fallback, so evaluation is total by construction.

use crate::severity::Severity;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Rule<T: ?Sized> {
    name: &'static str,
    severity: Severity,
    action: &'static str,
    matches: Predicate<T>,
}

/// Outcome of evaluating a candidate against a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDecision {
    /// Name of the rule that fired (`"default"` for the fallback).
    pub rule: &'static str,
    pub severity: Severity,
    pub action: &'static str,
}

/// An ordered rule list with a fallback tier.
pub struct RuleTable<T: ?Sized> {
    rules: Vec<Rule<T>>,
    fallback: RuleDecision,
}

impl<T: ?Sized> RuleTable<T> {
    /// Create a table whose fallback fires when no rule matches.
    pub fn with_fallback(severity: Severity, action: &'static str) -> Self {
        Self {
            rules: Vec::new(),
            fallback: RuleDecision {
                rule: "default",
                severity,
                action,
            },
        }
    }

    /// Append a rule. Rules are evaluated in the order they were added;
    /// the first match wins.
    pub fn rule(
        mut self,
        name: &'static str,
        severity: Severity,
        action: &'static str,
        matches: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule {
            name,
            severity,
            action,
            matches: Box::new(matches),
        });
        self
    }

    /// Evaluate top-down; first matching rule wins, else the fallback.
    pub fn decide(&self, candidate: &T) -> RuleDecision {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(candidate))
            .map(|rule| RuleDecision {
                rule: rule.name,
                severity: rule.severity,
                action: rule.action,
            })
            .unwrap_or(self.fallback)
    }

    /// Declared rule names, in evaluation order (fallback excluded).
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }
}
