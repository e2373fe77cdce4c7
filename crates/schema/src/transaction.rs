use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tradepulse_core::{CustomerId, ProductId, TransactionId};

/// Settlement state of a transaction's invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Partial,
}

impl PaymentStatus {
    /// Fold the spellings seen across ERP exports onto the canonical set.
    /// Returns `None` for values outside the known vocabulary.
    pub fn from_source(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" | "settled" | "cleared" => Some(Self::Paid),
            "unpaid" | "pending" | "due" | "overdue" | "credit" => Some(Self::Unpaid),
            "partial" | "partially paid" | "partially_paid" | "part paid" => Some(Self::Partial),
            _ => None,
        }
    }

    /// Fully settled; partial payments still count as outstanding.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// One row of the universal sales-transaction schema.
///
/// Immutable fact: once normalized, a transaction is never mutated by the
/// pipeline. Monetary fields are in the source currency's major unit;
/// `cost_price` is optional because many ERP exports simply lack it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub transaction_date: NaiveDate,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    /// Units sold; strictly positive.
    pub quantity: f64,
    /// Selling price per unit; non-negative.
    pub unit_price: f64,
    /// Purchase cost per unit, when the source provides it.
    pub cost_price: Option<f64>,
    /// Invoice total; strictly positive.
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_due_date: Option<NaiveDate>,
}
