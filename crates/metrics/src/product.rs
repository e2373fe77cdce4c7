//! Per-product aggregates, recomputed in full each run.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use tradepulse_core::{CustomerId, ProductId};
use tradepulse_schema::Transaction;

use crate::derived::DerivedFields;

/// Days counted as "recent" for the sales-velocity window.
pub const VELOCITY_WINDOW_DAYS: i64 = 30;

/// Read model: one row per distinct product in the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAggregate {
    pub product_id: ProductId,
    pub product_name: String,
    pub unique_customers: u32,
    pub total_quantity_sold: f64,
    /// Mean margin fraction across the product's transactions.
    pub avg_margin: f64,
    pub last_sold_date: NaiveDate,
    pub days_since_last_sold: i64,
    /// Units moved in the 30 days up to the reference date.
    pub quantity_sold_last_30d: f64,
}

/// Build one aggregate per distinct product, sorted by product id.
///
/// Same reference date as every other window in the run: the velocity
/// window and the dead-stock recency measure must not drift apart.
pub fn build_product_aggregates(
    transactions: &[Transaction],
    reference_date: NaiveDate,
) -> Vec<ProductAggregate> {
    let mut by_product: BTreeMap<ProductId, ProductAggregate> = BTreeMap::new();
    let mut customers: BTreeMap<ProductId, HashSet<CustomerId>> = BTreeMap::new();
    let mut margin_sums: BTreeMap<ProductId, (f64, u32)> = BTreeMap::new();

    for tx in transactions {
        let derived = DerivedFields::compute(tx, reference_date);

        let entry = by_product
            .entry(tx.product_id.clone())
            .or_insert_with(|| ProductAggregate {
                product_id: tx.product_id.clone(),
                product_name: tx.product_name.clone(),
                unique_customers: 0,
                total_quantity_sold: 0.0,
                avg_margin: 0.0,
                last_sold_date: tx.transaction_date,
                days_since_last_sold: 0,
                quantity_sold_last_30d: 0.0,
            });

        entry.total_quantity_sold += tx.quantity;

        if tx.transaction_date >= entry.last_sold_date {
            entry.last_sold_date = tx.transaction_date;
            entry.product_name = tx.product_name.clone();
        }

        let age = (reference_date - tx.transaction_date).num_days();
        if (0..VELOCITY_WINDOW_DAYS).contains(&age) {
            entry.quantity_sold_last_30d += tx.quantity;
        }

        customers
            .entry(tx.product_id.clone())
            .or_default()
            .insert(tx.customer_id.clone());

        let (sum, count) = margin_sums.entry(tx.product_id.clone()).or_insert((0.0, 0));
        *sum += derived.margin_percentage;
        *count += 1;
    }

    let mut aggregates: Vec<ProductAggregate> = by_product.into_values().collect();
    for agg in &mut aggregates {
        agg.unique_customers = customers
            .get(&agg.product_id)
            .map(|set| set.len() as u32)
            .unwrap_or(0);
        agg.avg_margin = margin_sums
            .get(&agg.product_id)
            .map(|(sum, count)| if *count == 0 { 0.0 } else { sum / f64::from(*count) })
            .unwrap_or(0.0);
        agg.days_since_last_sold = (reference_date - agg.last_sold_date).num_days();
    }
    aggregates
}
