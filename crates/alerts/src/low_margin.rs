//! Low margin classifier: recent sales priced too close to (or below) cost.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tradepulse_config::RuleThresholds;
use tradepulse_core::{CustomerId, ProductId, RunContext, TransactionId};
use tradepulse_metrics::{DerivedFields, ProductAggregate};
use tradepulse_schema::Transaction;

use crate::rules::RuleTable;
use crate::severity::Severity;

/// Only transactions this recent are worth chasing a rep about.
const RECENT_WINDOW_DAYS: i64 = 90;
/// Below this margin fraction a sale is barely above cost.
const SEVERE_MARGIN_FLOOR: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowMarginAlert {
    pub transaction_id: TransactionId,
    pub transaction_date: NaiveDate,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub margin_percentage: f64,
    /// Margin revenue given up versus pricing at the target threshold:
    /// `(threshold − margin) × unit_price × quantity`. Ranks by absolute
    /// money lost, not percentage.
    pub margin_gap_vs_target: f64,
    pub probable_cause: String,
    pub severity: Severity,
    pub recommended_action: String,
    pub analysis_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Severity cascade over the margin fraction, worst first.
fn severity_rules(thresholds: &RuleThresholds) -> RuleTable<f64> {
    let target = thresholds.low_margin_threshold;
    RuleTable::with_fallback(Severity::Low, "Within tolerance")
        .rule(
            "below-cost",
            Severity::Critical,
            "Stop the bleeding: reprice above cost immediately",
            |margin| *margin < 0.0,
        )
        .rule(
            "near-cost",
            Severity::High,
            "Review pricing with the sales rep before the next order",
            |margin| *margin < SEVERE_MARGIN_FLOOR,
        )
        .rule(
            "below-target",
            Severity::Medium,
            "Audit discounting on this product line",
            move |margin| *margin < target,
        )
}

/// First-match cause classifier, evaluated in this order: below cost,
/// missing cost data, discounted below the product's own average, generic.
fn probable_cause(
    margin_percentage: f64,
    cost_price: Option<f64>,
    product_avg_margin: Option<f64>,
) -> &'static str {
    if margin_percentage < 0.0 {
        "Selling below cost price"
    } else if cost_price.is_none() {
        "Cost price missing from source data"
    } else if product_avg_margin.is_some_and(|avg| margin_percentage < avg) {
        "Excessive discount versus typical margin for this product"
    } else {
        "Margin below target"
    }
}

/// Flag transactions from the last 90 days whose margin fraction sits below
/// the configured threshold. Rows without a cost price are skipped — there
/// is no margin to measure. Ordered by severity then absolute margin money
/// lost (largest gap first).
pub fn classify_low_margin(
    transactions: &[Transaction],
    products: &[ProductAggregate],
    thresholds: &RuleThresholds,
    ctx: &RunContext,
) -> Vec<LowMarginAlert> {
    let rules = severity_rules(thresholds);
    let avg_margin_by_product: HashMap<&ProductId, f64> = products
        .iter()
        .map(|p| (&p.product_id, p.avg_margin))
        .collect();

    let mut alerts: Vec<LowMarginAlert> = transactions
        .iter()
        .filter(|tx| {
            let age = ctx.days_since(tx.transaction_date);
            (0..=RECENT_WINDOW_DAYS).contains(&age) && tx.cost_price.is_some()
        })
        .filter_map(|tx| {
            let derived = DerivedFields::compute(tx, ctx.reference_date);
            if derived.margin_percentage >= thresholds.low_margin_threshold {
                return None;
            }
            let decision = rules.decide(&derived.margin_percentage);
            let gap = (thresholds.low_margin_threshold - derived.margin_percentage)
                * tx.unit_price
                * tx.quantity;
            Some(LowMarginAlert {
                transaction_id: tx.transaction_id.clone(),
                transaction_date: tx.transaction_date,
                customer_id: tx.customer_id.clone(),
                customer_name: tx.customer_name.clone(),
                product_id: tx.product_id.clone(),
                product_name: tx.product_name.clone(),
                quantity: tx.quantity,
                unit_price: tx.unit_price,
                margin_percentage: derived.margin_percentage,
                margin_gap_vs_target: gap,
                probable_cause: probable_cause(
                    derived.margin_percentage,
                    tx.cost_price,
                    avg_margin_by_product.get(&tx.product_id).copied(),
                )
                .to_string(),
                severity: decision.severity,
                recommended_action: decision.action.to_string(),
                analysis_date: ctx.reference_date,
                created_at: ctx.started_at,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then(b.margin_gap_vs_target.total_cmp(&a.margin_gap_vs_target))
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });
    alerts
}
