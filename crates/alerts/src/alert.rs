//! Unified alert record for mixed-type ranking and delivery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::credit_risk::CreditRiskAlert;
use crate::dead_stock::DeadStockAlert;
use crate::low_margin::LowMarginAlert;
use crate::severity::Severity;

/// One alert of any type, tagged for downstream formatters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "alert_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alert {
    DeadStock(DeadStockAlert),
    LowMargin(LowMarginAlert),
    CreditRisk(CreditRiskAlert),
}

impl Alert {
    pub fn severity(&self) -> Severity {
        match self {
            Self::DeadStock(a) => a.severity,
            Self::LowMargin(a) => a.severity,
            Self::CreditRisk(a) => a.severity,
        }
    }

    /// Identifier of the flagged entity (product, transaction or customer).
    pub fn entity_id(&self) -> &str {
        match self {
            Self::DeadStock(a) => a.product_id.as_str(),
            Self::LowMargin(a) => a.transaction_id.as_str(),
            Self::CreditRisk(a) => a.customer_id.as_str(),
        }
    }

    /// Display name of the flagged entity. Low-margin alerts combine
    /// customer and product, the way reps talk about a deal.
    pub fn entity_name(&self) -> String {
        match self {
            Self::DeadStock(a) => a.product_name.clone(),
            Self::LowMargin(a) => format!("{} - {}", a.customer_name, a.product_name),
            Self::CreditRisk(a) => a.customer_name.clone(),
        }
    }

    /// The number a digest leads with: days idle, margin money lost, or
    /// amount owed. Comparable only within an alert type; across types it
    /// is a tie-break after severity.
    pub fn headline_metric(&self) -> f64 {
        match self {
            Self::DeadStock(a) => a.days_since_last_sold as f64,
            Self::LowMargin(a) => a.margin_gap_vs_target,
            Self::CreditRisk(a) => a.total_overdue_amount,
        }
    }

    pub fn recommended_action(&self) -> &str {
        match self {
            Self::DeadStock(a) => &a.recommended_action,
            Self::LowMargin(a) => &a.recommended_action,
            Self::CreditRisk(a) => &a.recommended_action,
        }
    }

    pub fn analysis_date(&self) -> NaiveDate {
        match self {
            Self::DeadStock(a) => a.analysis_date,
            Self::LowMargin(a) => a.analysis_date,
            Self::CreditRisk(a) => a.analysis_date,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::DeadStock(a) => a.created_at,
            Self::LowMargin(a) => a.created_at,
            Self::CreditRisk(a) => a.created_at,
        }
    }
}
