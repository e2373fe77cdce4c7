//! Credit risk classifier: customers sitting on overdue invoices.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tradepulse_config::RuleThresholds;
use tradepulse_core::{CustomerId, RunContext, TransactionId};
use tradepulse_metrics::{CustomerAggregate, DerivedFields};
use tradepulse_schema::Transaction;

use crate::rules::RuleTable;
use crate::severity::Severity;

/// Outstanding amount above which a moderately late debt is escalated
/// ahead of the plain day-based tiers.
const LARGE_DEBT_FLOOR: f64 = 100_000.0;
/// Days late a large debt must be before the escalation applies.
const LARGE_DEBT_MIN_DAYS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditRiskAlert {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub overdue_invoice_count: u32,
    pub total_overdue_amount: f64,
    pub max_days_overdue: i64,
    pub avg_days_overdue: f64,
    pub earliest_unpaid_date: NaiveDate,
    /// Overdue invoice ids, oldest transaction first.
    pub overdue_invoice_ids: Vec<TransactionId>,
    /// Stepped payment-behavior score: 100 = healthy, 0 = worst.
    pub payment_score: u8,
    /// Overdue exposure as a share of lifetime value; `None` when the
    /// customer has no recorded lifetime value to compare against.
    pub risk_percentage_of_ltv: Option<f64>,
    pub severity: Severity,
    pub recommended_action: String,
    pub analysis_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Stepped inverse score over the worst overdue age.
pub fn payment_score(max_days_overdue: i64) -> u8 {
    if max_days_overdue > 90 {
        0
    } else if max_days_overdue > 60 {
        25
    } else if max_days_overdue > 30 {
        50
    } else if max_days_overdue > 15 {
        75
    } else {
        100
    }
}

/// Per-customer accumulator for the overdue pass; also the rule-table
/// candidate, so the compound condition can see amount and age together.
#[derive(Debug, Clone, PartialEq)]
struct OverdueSummary {
    total_overdue_amount: f64,
    max_days_overdue: i64,
    days_sum: i64,
    earliest_unpaid_date: NaiveDate,
    customer_name: String,
    /// (transaction_date, id) pairs; sorted before the alert is built.
    invoices: Vec<(NaiveDate, TransactionId)>,
}

/// Severity cascade, evaluated in this exact order. The compound
/// large-debt rule deliberately outranks the plain day thresholds: a big
/// exposure that is "only" two months late is worse than a small one at
/// three months.
fn severity_rules(thresholds: &RuleThresholds) -> RuleTable<OverdueSummary> {
    let entry_days = i64::from(thresholds.credit_risk_days);
    RuleTable::with_fallback(Severity::Info, "Monitor payment behavior")
        .rule(
            "large-debt-two-months-late",
            Severity::Critical,
            "Stop credit and start legal recovery",
            |s: &OverdueSummary| {
                s.total_overdue_amount > LARGE_DEBT_FLOOR && s.max_days_overdue > LARGE_DEBT_MIN_DAYS
            },
        )
        .rule(
            "past-90-days",
            Severity::Critical,
            "Stop credit and start legal recovery",
            |s| s.max_days_overdue > 90,
        )
        .rule(
            "past-60-days",
            Severity::High,
            "Send final notice before credit hold",
            |s| s.max_days_overdue > 60,
        )
        .rule(
            "past-30-days",
            Severity::Medium,
            "Send a stern payment reminder",
            |s| s.max_days_overdue > 30,
        )
        .rule(
            "past-entry-threshold",
            Severity::Low,
            "Send a polite payment reminder",
            move |s| s.max_days_overdue > entry_days,
        )
}

/// Aggregate overdue exposure per customer and classify it. A transaction
/// enters the pass when it is not fully paid and at least
/// `credit_risk_days` past due; customers whose invoices have no due date
/// cannot be assessed and are skipped. Ordered by severity then total
/// overdue amount (largest first).
pub fn classify_credit_risk(
    transactions: &[Transaction],
    customers: &[CustomerAggregate],
    thresholds: &RuleThresholds,
    ctx: &RunContext,
) -> Vec<CreditRiskAlert> {
    let rules = severity_rules(thresholds);
    let entry_days = i64::from(thresholds.credit_risk_days);
    let ltv_by_customer: HashMap<&CustomerId, f64> = customers
        .iter()
        .map(|c| (&c.customer_id, c.lifetime_value))
        .collect();

    let mut summaries: BTreeMap<CustomerId, OverdueSummary> = BTreeMap::new();

    for tx in transactions {
        if tx.payment_status.is_settled() {
            continue;
        }
        let derived = DerivedFields::compute(tx, ctx.reference_date);
        let Some(days) = derived.days_overdue else {
            continue;
        };
        if days < entry_days {
            continue;
        }

        let summary = summaries
            .entry(tx.customer_id.clone())
            .or_insert_with(|| OverdueSummary {
                total_overdue_amount: 0.0,
                max_days_overdue: 0,
                days_sum: 0,
                earliest_unpaid_date: tx.transaction_date,
                customer_name: tx.customer_name.clone(),
                invoices: Vec::new(),
            });

        summary.total_overdue_amount += tx.total_amount;
        summary.max_days_overdue = summary.max_days_overdue.max(days);
        summary.days_sum += days;
        summary.earliest_unpaid_date = summary.earliest_unpaid_date.min(tx.transaction_date);
        summary
            .invoices
            .push((tx.transaction_date, tx.transaction_id.clone()));
    }

    let mut alerts: Vec<CreditRiskAlert> = summaries
        .into_iter()
        .map(|(customer_id, mut summary)| {
            summary.invoices.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
            let invoice_count = summary.invoices.len() as u32;
            let decision = rules.decide(&summary);
            let lifetime_value = ltv_by_customer
                .get(&customer_id)
                .copied()
                .unwrap_or(0.0);
            let risk_percentage_of_ltv = if lifetime_value > 0.0 {
                Some(summary.total_overdue_amount / lifetime_value * 100.0)
            } else {
                None
            };

            CreditRiskAlert {
                customer_id,
                customer_name: summary.customer_name,
                overdue_invoice_count: invoice_count,
                total_overdue_amount: summary.total_overdue_amount,
                max_days_overdue: summary.max_days_overdue,
                avg_days_overdue: summary.days_sum as f64 / f64::from(invoice_count),
                earliest_unpaid_date: summary.earliest_unpaid_date,
                overdue_invoice_ids: summary.invoices.into_iter().map(|(_, id)| id).collect(),
                payment_score: payment_score(summary.max_days_overdue),
                risk_percentage_of_ltv,
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
            .then(b.total_overdue_amount.total_cmp(&a.total_overdue_amount))
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    alerts
}
