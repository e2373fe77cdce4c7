//! `tradepulse-alerts`
//!
//! **Responsibility:** the rule-evaluation and scoring layer — three
//! independent classifiers (dead stock, low margin, credit risk) that turn
//! the metrics crate's aggregates into ranked, severity-tagged alerts.
//!
//! Each classifier is a pure function of an immutable snapshot plus the
//! run's thresholds and context: no shared mutable state, no ordering
//! dependency between them, total over well-formed input. Severity cascades
//! are declared as ordered rule tables ([`rules::RuleTable`]) evaluated
//! first-match-wins, so the priority of each condition is data, not
//! implicit code order.

pub mod alert;
pub mod credit_risk;
pub mod dead_stock;
pub mod low_margin;
pub mod rules;
pub mod severity;

pub use alert::Alert;
pub use credit_risk::{CreditRiskAlert, classify_credit_risk, payment_score};
pub use dead_stock::{DeadStockAlert, classify_dead_stock};
pub use low_margin::{LowMarginAlert, classify_low_margin};
pub use rules::{RuleDecision, RuleTable};
pub use severity::Severity;
