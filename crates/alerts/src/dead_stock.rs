//! Dead stock classifier: products that have stopped moving.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tradepulse_config::RuleThresholds;
use tradepulse_core::{ProductId, RunContext};
use tradepulse_metrics::ProductAggregate;

use crate::rules::RuleTable;
use crate::severity::Severity;

/// Fraction of lifetime sales volume assumed to still sit on the shelf.
const ASSUMED_ON_HAND_FRACTION: f64 = 0.10;
/// Flat per-unit value used until real inventory valuation is integrated.
const FLAT_UNIT_VALUE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadStockAlert {
    pub product_id: ProductId,
    pub product_name: String,
    pub days_since_last_sold: i64,
    pub last_sold_date: NaiveDate,
    pub total_quantity_sold: f64,
    /// Heuristic only: lifetime quantity × assumed on-hand fraction × flat
    /// unit value. Do not treat as a financial figure — it exists to rank
    /// products until inventory valuation data is available.
    pub estimated_value_locked: f64,
    pub severity: Severity,
    pub recommended_action: String,
    pub analysis_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Severity cascade over `days_since_last_sold`, most severe first.
///
/// The Low fallback is unreachable once the threshold filter has run; it is
/// kept as the table's floor.
fn severity_rules(thresholds: &RuleThresholds) -> RuleTable<i64> {
    let stale = i64::from(thresholds.dead_stock_days);
    RuleTable::with_fallback(Severity::Low, "No action needed")
        .rule(
            "stale-180d",
            Severity::Critical,
            "Liquidate: clearance pricing or bundle with fast movers",
            |days| *days >= 180,
        )
        .rule(
            "stale-120d",
            Severity::High,
            "Promote: targeted discount or redistribute to faster outlets",
            |days| *days >= 120,
        )
        .rule(
            "stale-threshold",
            Severity::Medium,
            "Monitor: flag for the next purchasing review",
            move |days| *days >= stale,
        )
}

/// Flag every product idle for at least `dead_stock_days`, ordered by
/// severity then staleness (most stale first).
pub fn classify_dead_stock(
    products: &[ProductAggregate],
    thresholds: &RuleThresholds,
    ctx: &RunContext,
) -> Vec<DeadStockAlert> {
    let rules = severity_rules(thresholds);
    let cutoff = i64::from(thresholds.dead_stock_days);

    let mut alerts: Vec<DeadStockAlert> = products
        .iter()
        .filter(|p| p.days_since_last_sold >= cutoff)
        .map(|p| {
            let decision = rules.decide(&p.days_since_last_sold);
            DeadStockAlert {
                product_id: p.product_id.clone(),
                product_name: p.product_name.clone(),
                days_since_last_sold: p.days_since_last_sold,
                last_sold_date: p.last_sold_date,
                total_quantity_sold: p.total_quantity_sold,
                estimated_value_locked: p.total_quantity_sold
                    * ASSUMED_ON_HAND_FRACTION
                    * FLAT_UNIT_VALUE,
                severity: decision.severity,
                recommended_action: decision.action.to_string(),
                analysis_date: ctx.reference_date,
                created_at: ctx.started_at,
            }
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then(b.days_since_last_sold.cmp(&a.days_since_last_sold))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    alerts
}
