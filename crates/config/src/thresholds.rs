use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration failure. Always fatal: the caller must refuse to run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{name}` must be at least 1 day (got {value})")]
    DayThresholdOutOfRange { name: &'static str, value: u32 },

    #[error("`low_margin_threshold` must be a fraction in (0, 1) (got {value})")]
    MarginThresholdOutOfRange { value: f64 },

    #[error("invalid thresholds for industry `{industry}`: {source}")]
    Industry {
        industry: String,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Alert thresholds for one analysis run.
///
/// Immutable value object; cheap to copy, passed by reference into each
/// classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Days without a sale before a product counts as dead stock.
    pub dead_stock_days: u32,
    /// Margin fraction below which a sale is flagged (0.10 = 10%).
    pub low_margin_threshold: f64,
    /// Days overdue before a customer enters the credit-risk pass.
    pub credit_risk_days: u32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            dead_stock_days: 90,
            low_margin_threshold: 0.10,
            credit_risk_days: 30,
        }
    }
}

impl RuleThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dead_stock_days == 0 {
            return Err(ConfigError::DayThresholdOutOfRange {
                name: "dead_stock_days",
                value: self.dead_stock_days,
            });
        }
        if self.credit_risk_days == 0 {
            return Err(ConfigError::DayThresholdOutOfRange {
                name: "credit_risk_days",
                value: self.credit_risk_days,
            });
        }
        if !self.low_margin_threshold.is_finite()
            || self.low_margin_threshold <= 0.0
            || self.low_margin_threshold >= 1.0
        {
            return Err(ConfigError::MarginThresholdOutOfRange {
                value: self.low_margin_threshold,
            });
        }
        Ok(())
    }
}

/// Partial threshold set; unset fields fall through to the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdOverrides {
    pub dead_stock_days: Option<u32>,
    pub low_margin_threshold: Option<f64>,
    pub credit_risk_days: Option<u32>,
}

impl ThresholdOverrides {
    fn apply(&self, base: RuleThresholds) -> RuleThresholds {
        RuleThresholds {
            dead_stock_days: self.dead_stock_days.unwrap_or(base.dead_stock_days),
            low_margin_threshold: self
                .low_margin_threshold
                .unwrap_or(base.low_margin_threshold),
            credit_risk_days: self.credit_risk_days.unwrap_or(base.credit_risk_days),
        }
    }
}

/// Full rule configuration: defaults plus industry benchmark overrides.
///
/// Deserializable from TOML/JSON/YAML via serde, e.g.:
///
/// ```toml
/// [defaults]
/// dead_stock_days = 90
///
/// [industry_overrides.pharma]
/// dead_stock_days = 45
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub defaults: RuleThresholds,
    pub industry_overrides: BTreeMap<String, ThresholdOverrides>,
}

impl RuleConfig {
    /// Resolve the effective thresholds for an industry.
    ///
    /// Unknown (or absent) industries get the defaults; an override set only
    /// replaces the fields it names.
    pub fn resolve(&self, industry: Option<&str>) -> RuleThresholds {
        match industry.and_then(|key| self.industry_overrides.get(key)) {
            Some(overrides) => overrides.apply(self.defaults),
            None => self.defaults,
        }
    }

    /// Validate the defaults and every resolved override set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.defaults.validate()?;
        for (industry, overrides) in &self.industry_overrides {
            overrides
                .apply(self.defaults)
                .validate()
                .map_err(|source| ConfigError::Industry {
                    industry: industry.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let t = RuleThresholds::default();
        assert_eq!(t.dead_stock_days, 90);
        assert_eq!(t.low_margin_threshold, 0.10);
        assert_eq!(t.credit_risk_days, 30);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn zero_day_thresholds_are_rejected() {
        let t = RuleThresholds {
            dead_stock_days: 0,
            ..RuleThresholds::default()
        };
        match t.validate().unwrap_err() {
            ConfigError::DayThresholdOutOfRange { name, .. } => {
                assert_eq!(name, "dead_stock_days")
            }
            other => panic!("Expected DayThresholdOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn margin_threshold_must_be_a_proper_fraction() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let t = RuleThresholds {
                low_margin_threshold: bad,
                ..RuleThresholds::default()
            };
            assert!(t.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn resolve_merges_overrides_over_defaults() {
        let mut config = RuleConfig::default();
        config.industry_overrides.insert(
            "pharma".to_string(),
            ThresholdOverrides {
                dead_stock_days: Some(45),
                ..ThresholdOverrides::default()
            },
        );

        let pharma = config.resolve(Some("pharma"));
        assert_eq!(pharma.dead_stock_days, 45);
        assert_eq!(pharma.low_margin_threshold, 0.10);

        assert_eq!(config.resolve(Some("unknown")), RuleThresholds::default());
        assert_eq!(config.resolve(None), RuleThresholds::default());
    }

    #[test]
    fn validate_names_the_offending_industry() {
        let mut config = RuleConfig::default();
        config.industry_overrides.insert(
            "hardware".to_string(),
            ThresholdOverrides {
                credit_risk_days: Some(0),
                ..ThresholdOverrides::default()
            },
        );

        match config.validate().unwrap_err() {
            ConfigError::Industry { industry, .. } => assert_eq!(industry, "hardware"),
            other => panic!("Expected Industry error, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let config: RuleConfig = serde_json::from_str(
            r#"{"defaults": {"dead_stock_days": 120},
                "industry_overrides": {"fmcg": {"credit_risk_days": 15}}}"#,
        )
        .unwrap();
        assert_eq!(config.defaults.dead_stock_days, 120);
        assert_eq!(config.defaults.credit_risk_days, 30);
        assert_eq!(config.resolve(Some("fmcg")).credit_risk_days, 15);
    }
}
