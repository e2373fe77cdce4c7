//! Per-transaction derived fields.
//!
//! Each value is a pure function of one row plus the run's reference date —
//! no cross-row dependency, so rows can be evaluated in any order.

use chrono::NaiveDate;
use serde::Serialize;

use tradepulse_schema::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFields {
    /// `unit_price − cost_price`; 0.0 when cost is unknown.
    pub unit_margin: f64,
    /// `unit_margin / unit_price` as a fraction; 0.0 for free-of-charge rows.
    pub margin_percentage: f64,
    /// Whole days past the due date, floored at 0. `None` when the due date
    /// is unknown; 0 once the invoice is settled.
    pub days_overdue: Option<i64>,
}

impl DerivedFields {
    pub fn compute(tx: &Transaction, reference_date: NaiveDate) -> Self {
        let unit_margin = match tx.cost_price {
            Some(cost) => tx.unit_price - cost,
            None => 0.0,
        };

        let margin_percentage = if tx.unit_price == 0.0 {
            0.0
        } else {
            unit_margin / tx.unit_price
        };

        let days_overdue = tx.payment_due_date.map(|due| {
            if tx.payment_status.is_settled() {
                0
            } else {
                (reference_date - due).num_days().max(0)
            }
        });

        Self {
            unit_margin,
            margin_percentage,
            days_overdue,
        }
    }
}
