//! Per-customer aggregates, recomputed in full each run.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use tradepulse_core::CustomerId;
use tradepulse_schema::Transaction;

use crate::derived::DerivedFields;

/// Read model: one row per distinct customer in the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerAggregate {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub total_transactions: u32,
    /// Cumulative `total_amount` across all of the customer's transactions.
    pub lifetime_value: f64,
    /// Mean margin fraction across the customer's transactions.
    pub avg_margin: f64,
    pub last_purchase_date: NaiveDate,
    pub days_since_last_purchase: i64,
    /// Sum of `total_amount` over not-fully-paid transactions.
    pub total_outstanding: f64,
    /// Count of transactions currently past their due date.
    pub overdue_invoice_count: u32,
}

/// Build one aggregate per distinct customer, sorted by customer id.
///
/// Full-batch recompute over the transaction set: deterministic for a fixed
/// input and reference date, no state carried between runs.
pub fn build_customer_aggregates(
    transactions: &[Transaction],
    reference_date: NaiveDate,
) -> Vec<CustomerAggregate> {
    let mut by_customer: BTreeMap<CustomerId, CustomerAggregate> = BTreeMap::new();
    let mut margin_sums: BTreeMap<CustomerId, f64> = BTreeMap::new();

    for tx in transactions {
        let derived = DerivedFields::compute(tx, reference_date);

        let entry = by_customer
            .entry(tx.customer_id.clone())
            .or_insert_with(|| CustomerAggregate {
                customer_id: tx.customer_id.clone(),
                customer_name: tx.customer_name.clone(),
                total_transactions: 0,
                lifetime_value: 0.0,
                avg_margin: 0.0,
                last_purchase_date: tx.transaction_date,
                days_since_last_purchase: 0,
                total_outstanding: 0.0,
                overdue_invoice_count: 0,
            });

        entry.total_transactions += 1;
        entry.lifetime_value += tx.total_amount;

        if tx.transaction_date >= entry.last_purchase_date {
            entry.last_purchase_date = tx.transaction_date;
            // Names drift across exports; keep the most recent spelling.
            entry.customer_name = tx.customer_name.clone();
        }

        if !tx.payment_status.is_settled() {
            entry.total_outstanding += tx.total_amount;
        }
        if derived.days_overdue.is_some_and(|d| d > 0) {
            entry.overdue_invoice_count += 1;
        }

        *margin_sums.entry(tx.customer_id.clone()).or_insert(0.0) += derived.margin_percentage;
    }

    let mut aggregates: Vec<CustomerAggregate> = by_customer.into_values().collect();
    for agg in &mut aggregates {
        agg.avg_margin = margin_sums
            .get(&agg.customer_id)
            .map(|sum| sum / f64::from(agg.total_transactions))
            .unwrap_or(0.0);
        agg.days_since_last_purchase = (reference_date - agg.last_purchase_date).num_days();
    }
    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepulse_core::{ProductId, TransactionId};
    use tradepulse_schema::PaymentStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(
        id: &str,
        customer: &str,
        day: NaiveDate,
        amount: f64,
        status: PaymentStatus,
        due: Option<NaiveDate>,
    ) -> Transaction {
        Transaction {
            transaction_id: TransactionId::new(id),
            transaction_date: day,
            customer_id: CustomerId::new(customer),
            customer_name: format!("{customer} & Sons"),
            product_id: ProductId::new("SKU-1"),
            product_name: "Bearing 6204".to_string(),
            quantity: 1.0,
            unit_price: amount,
            cost_price: Some(amount * 0.8),
            total_amount: amount,
            payment_status: status,
            payment_due_date: due,
        }
    }

    #[test]
    fn aggregates_lifetime_value_and_recency() {
        let reference = date(2024, 6, 1);
        let txs = vec![
            tx("T1", "C1", date(2024, 1, 10), 500.0, PaymentStatus::Paid, None),
            tx("T2", "C1", date(2024, 5, 2), 300.0, PaymentStatus::Paid, None),
            tx("T3", "C2", date(2024, 4, 1), 900.0, PaymentStatus::Paid, None),
        ];

        let aggs = build_customer_aggregates(&txs, reference);
        assert_eq!(aggs.len(), 2);

        let c1 = &aggs[0];
        assert_eq!(c1.customer_id.as_str(), "C1");
        assert_eq!(c1.total_transactions, 2);
        assert_eq!(c1.lifetime_value, 800.0);
        assert_eq!(c1.last_purchase_date, date(2024, 5, 2));
        assert_eq!(c1.days_since_last_purchase, 30);
        assert!((c1.avg_margin - 0.2).abs() < 1e-9);
    }

    #[test]
    fn outstanding_and_overdue_track_unpaid_rows() {
        let reference = date(2024, 6, 1);
        let txs = vec![
            // Overdue: unpaid, due in the past.
            tx(
                "T1",
                "C1",
                date(2024, 3, 1),
                1000.0,
                PaymentStatus::Unpaid,
                Some(date(2024, 4, 1)),
            ),
            // Outstanding but not yet overdue.
            tx(
                "T2",
                "C1",
                date(2024, 5, 20),
                400.0,
                PaymentStatus::Partial,
                Some(date(2024, 7, 1)),
            ),
            // Settled.
            tx(
                "T3",
                "C1",
                date(2024, 5, 25),
                250.0,
                PaymentStatus::Paid,
                Some(date(2024, 5, 1)),
            ),
        ];

        let aggs = build_customer_aggregates(&txs, reference);
        let c1 = &aggs[0];
        assert_eq!(c1.total_outstanding, 1400.0);
        assert_eq!(c1.overdue_invoice_count, 1);
    }

    #[test]
    fn output_is_sorted_by_customer_id() {
        let reference = date(2024, 6, 1);
        let txs = vec![
            tx("T1", "C9", date(2024, 1, 1), 10.0, PaymentStatus::Paid, None),
            tx("T2", "C1", date(2024, 1, 1), 10.0, PaymentStatus::Paid, None),
            tx("T3", "C5", date(2024, 1, 1), 10.0, PaymentStatus::Paid, None),
        ];
        let ids: Vec<String> = build_customer_aggregates(&txs, reference)
            .iter()
            .map(|a| a.customer_id.to_string())
            .collect();
        assert_eq!(ids, vec!["C1", "C5", "C9"]);
    }

    #[test]
    fn name_follows_most_recent_purchase() {
        let reference = date(2024, 6, 1);
        let mut older = tx("T1", "C1", date(2024, 1, 1), 10.0, PaymentStatus::Paid, None);
        older.customer_name = "Sharma Trading Co".to_string();
        let mut newer = tx("T2", "C1", date(2024, 5, 1), 10.0, PaymentStatus::Paid, None);
        newer.customer_name = "Sharma Traders".to_string();

        let aggs = build_customer_aggregates(&[older, newer], reference);
        assert_eq!(aggs[0].customer_name, "Sharma Traders");
    }
}
