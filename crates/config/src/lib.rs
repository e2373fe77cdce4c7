//! `tradepulse-config`
//!
//! **Responsibility:** the rule configuration store — alert thresholds and
//! industry-specific override sets.
//!
//! Thresholds are immutable value objects passed explicitly into each
//! classifier call; there is no global configuration state. A config that
//! fails validation aborts the run before any computation starts: silently
//! substituting defaults would misclassify severity.

pub mod thresholds;

pub use thresholds::{ConfigError, RuleConfig, RuleThresholds, ThresholdOverrides};
