//! Schema normalizer: heterogeneous source records → universal transactions.
//!
//! Sources disagree on column names ("Invoice No" vs "txn_id"), number
//! formatting ("₹1,20,000" vs 120000.0) and date formats. The normalizer
//! resolves all of that through a declared [`FieldMapping`] and rejects rows
//! that fail the schema's constraints. Rejection is per-record: one bad row
//! never fails a batch.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use tradepulse_core::{CustomerId, ProductId, TransactionId};

use crate::transaction::{PaymentStatus, Transaction};

/// A raw source record: column name → JSON value, as produced by CSV or
/// warehouse loaders.
pub type RawRecord = Map<String, Value>;

/// Universal field names of the transaction schema.
pub mod fields {
    pub const TRANSACTION_ID: &str = "transaction_id";
    pub const TRANSACTION_DATE: &str = "transaction_date";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const PRODUCT_ID: &str = "product_id";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const COST_PRICE: &str = "cost_price";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const PAYMENT_STATUS: &str = "payment_status";
    pub const PAYMENT_DUE_DATE: &str = "payment_due_date";
}

/// Date formats accepted from source systems, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Why a record was excluded from the computation set.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum MalformedRecord {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not a number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("field `{field}` must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error("field `{field}` is not a recognizable date: `{value}`")]
    InvalidDate { field: &'static str, value: String },

    #[error("unrecognized payment status `{0}`")]
    InvalidPaymentStatus(String),

    #[error("transaction is dated after the analysis reference date")]
    FutureDated,

    #[error("duplicate transaction id `{0}`")]
    DuplicateTransactionId(String),
}

/// A rejected source record with its position in the input batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: MalformedRecord,
}

/// Result of normalizing a batch: accepted transactions plus typed rejects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub rejects: Vec<RejectedRecord>,
}

impl NormalizedBatch {
    pub fn accepted(&self) -> usize {
        self.transactions.len()
    }

    pub fn rejected(&self) -> usize {
        self.rejects.len()
    }
}

/// Mapping from universal field names to source column names.
///
/// Fields without an explicit entry fall back to the universal name itself,
/// so a source that already uses the universal schema needs no mapping.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    columns: Vec<(&'static str, String)>,
}

impl FieldMapping {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Declare that `universal` is found under `source` in this source's
    /// exports.
    pub fn with_source_column(mut self, universal: &'static str, source: impl Into<String>) -> Self {
        self.columns.push((universal, source.into()));
        self
    }

    fn source_column<'a>(&'a self, universal: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|(u, _)| *u == universal)
            .map(|(_, s)| s.as_str())
            .unwrap_or(universal)
    }
}

/// Maps and validates raw records against the universal schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaNormalizer {
    mapping: FieldMapping,
}

impl SchemaNormalizer {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    /// Normalize a whole batch.
    ///
    /// Batch-level rules on top of per-record validation:
    /// - duplicate `transaction_id`s keep the first occurrence only;
    /// - rows dated after `reference_date` are rejected (future-dated rows
    ///   are always source defects).
    pub fn normalize_batch(
        &self,
        records: &[RawRecord],
        reference_date: NaiveDate,
    ) -> NormalizedBatch {
        let mut transactions = Vec::with_capacity(records.len());
        let mut rejects = Vec::new();
        let mut seen: HashSet<TransactionId> = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            match self.normalize_record(record) {
                Ok(tx) => {
                    if tx.transaction_date > reference_date {
                        rejects.push(RejectedRecord {
                            index,
                            reason: MalformedRecord::FutureDated,
                        });
                    } else if !seen.insert(tx.transaction_id.clone()) {
                        rejects.push(RejectedRecord {
                            index,
                            reason: MalformedRecord::DuplicateTransactionId(
                                tx.transaction_id.to_string(),
                            ),
                        });
                    } else {
                        transactions.push(tx);
                    }
                }
                Err(reason) => rejects.push(RejectedRecord { index, reason }),
            }
        }

        NormalizedBatch {
            transactions,
            rejects,
        }
    }

    /// Normalize a single record against the schema.
    pub fn normalize_record(&self, record: &RawRecord) -> Result<Transaction, MalformedRecord> {
        let transaction_id = self.required_id::<TransactionId>(record, fields::TRANSACTION_ID)?;
        let transaction_date = self.required_date(record, fields::TRANSACTION_DATE)?;
        let customer_id = self.required_id::<CustomerId>(record, fields::CUSTOMER_ID)?;
        let customer_name = self.required_string(record, fields::CUSTOMER_NAME)?;
        let product_id = self.required_id::<ProductId>(record, fields::PRODUCT_ID)?;
        let product_name = self.required_string(record, fields::PRODUCT_NAME)?;

        let quantity = self.required_number(record, fields::QUANTITY)?;
        if quantity <= 0.0 {
            return Err(MalformedRecord::NonPositive {
                field: fields::QUANTITY,
                value: quantity,
            });
        }

        let unit_price = self.required_number(record, fields::UNIT_PRICE)?;
        if unit_price < 0.0 {
            return Err(MalformedRecord::NegativeAmount {
                field: fields::UNIT_PRICE,
                value: unit_price,
            });
        }

        let cost_price = self.optional_number(record, fields::COST_PRICE)?;
        if let Some(cost) = cost_price {
            if cost < 0.0 {
                return Err(MalformedRecord::NegativeAmount {
                    field: fields::COST_PRICE,
                    value: cost,
                });
            }
        }

        let total_amount = self.required_number(record, fields::TOTAL_AMOUNT)?;
        if total_amount <= 0.0 {
            return Err(MalformedRecord::NonPositive {
                field: fields::TOTAL_AMOUNT,
                value: total_amount,
            });
        }

        let status_raw = self.required_string(record, fields::PAYMENT_STATUS)?;
        let payment_status = PaymentStatus::from_source(&status_raw)
            .ok_or(MalformedRecord::InvalidPaymentStatus(status_raw))?;

        let payment_due_date = self.optional_date(record, fields::PAYMENT_DUE_DATE)?;

        Ok(Transaction {
            transaction_id,
            transaction_date,
            customer_id,
            customer_name,
            product_id,
            product_name,
            quantity,
            unit_price,
            cost_price,
            total_amount,
            payment_status,
            payment_due_date,
        })
    }

    fn value<'a>(&self, record: &'a RawRecord, universal: &'static str) -> Option<&'a Value> {
        let value = record.get(self.mapping.source_column(universal))?;
        if value.is_null() { None } else { Some(value) }
    }

    fn required_string(
        &self,
        record: &RawRecord,
        universal: &'static str,
    ) -> Result<String, MalformedRecord> {
        let value = self
            .value(record, universal)
            .ok_or(MalformedRecord::MissingField(universal))?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if text.is_empty() {
            return Err(MalformedRecord::MissingField(universal));
        }
        Ok(text)
    }

    fn required_id<T: FromStr>(
        &self,
        record: &RawRecord,
        universal: &'static str,
    ) -> Result<T, MalformedRecord> {
        let raw = self.required_string(record, universal)?;
        T::from_str(&raw).map_err(|_| MalformedRecord::MissingField(universal))
    }

    fn required_number(
        &self,
        record: &RawRecord,
        universal: &'static str,
    ) -> Result<f64, MalformedRecord> {
        self.optional_number(record, universal)?
            .ok_or(MalformedRecord::MissingField(universal))
    }

    fn optional_number(
        &self,
        record: &RawRecord,
        universal: &'static str,
    ) -> Result<Option<f64>, MalformedRecord> {
        let Some(value) = self.value(record, universal) else {
            return Ok(None);
        };
        match value {
            Value::Number(n) => n.as_f64().map(Some).ok_or(MalformedRecord::InvalidNumber {
                field: universal,
                value: n.to_string(),
            }),
            Value::String(s) => {
                let cleaned = clean_numeric(s);
                if cleaned.is_empty() {
                    return Ok(None);
                }
                cleaned
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| MalformedRecord::InvalidNumber {
                        field: universal,
                        value: s.clone(),
                    })
            }
            other => Err(MalformedRecord::InvalidNumber {
                field: universal,
                value: other.to_string(),
            }),
        }
    }

    fn required_date(
        &self,
        record: &RawRecord,
        universal: &'static str,
    ) -> Result<NaiveDate, MalformedRecord> {
        self.optional_date(record, universal)?
            .ok_or(MalformedRecord::MissingField(universal))
    }

    fn optional_date(
        &self,
        record: &RawRecord,
        universal: &'static str,
    ) -> Result<Option<NaiveDate>, MalformedRecord> {
        let Some(value) = self.value(record, universal) else {
            return Ok(None);
        };
        let Value::String(raw) = value else {
            return Err(MalformedRecord::InvalidDate {
                field: universal,
                value: value.to_string(),
            });
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(Some(date));
            }
        }
        Err(MalformedRecord::InvalidDate {
            field: universal,
            value: raw.clone(),
        })
    }
}

/// Strip currency symbols and thousands separators from source numerics
/// ("₹1,20,000.50" → "120000.50"). Anything else is left in place so that
/// genuinely non-numeric text still fails to parse.
fn clean_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '₹' | '$' | '€' | ',') && !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(entries: &[(&str, Value)]) -> RawRecord {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn good_record() -> RawRecord {
        record(&[
            ("transaction_id", json!("TXN-001")),
            ("transaction_date", json!("2024-03-01")),
            ("customer_id", json!("CUST-1")),
            ("customer_name", json!("Sharma Traders")),
            ("product_id", json!("SKU-9")),
            ("product_name", json!("Bearing 6204")),
            ("quantity", json!(4)),
            ("unit_price", json!(250.0)),
            ("cost_price", json!(200.0)),
            ("total_amount", json!(1000.0)),
            ("payment_status", json!("UNPAID")),
            ("payment_due_date", json!("2024-03-31")),
        ])
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn normalizes_well_formed_record() {
        let normalizer = SchemaNormalizer::default();
        let tx = normalizer.normalize_record(&good_record()).unwrap();
        assert_eq!(tx.transaction_id.as_str(), "TXN-001");
        assert_eq!(tx.customer_name, "Sharma Traders");
        assert_eq!(tx.quantity, 4.0);
        assert_eq!(tx.cost_price, Some(200.0));
        assert_eq!(tx.payment_status, PaymentStatus::Unpaid);
        assert_eq!(
            tx.payment_due_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
        );
    }

    #[test]
    fn maps_renamed_source_columns() {
        let mapping = FieldMapping::identity()
            .with_source_column(fields::TRANSACTION_ID, "Invoice No")
            .with_source_column(fields::QUANTITY, "Qty");
        let normalizer = SchemaNormalizer::new(mapping);

        let mut rec = good_record();
        let id = rec.remove("transaction_id").unwrap();
        rec.insert("Invoice No".to_string(), id);
        let qty = rec.remove("quantity").unwrap();
        rec.insert("Qty".to_string(), qty);

        let tx = normalizer.normalize_record(&rec).unwrap();
        assert_eq!(tx.transaction_id.as_str(), "TXN-001");
        assert_eq!(tx.quantity, 4.0);
    }

    #[test]
    fn parses_currency_formatted_numbers() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.insert("total_amount".to_string(), json!("₹1,20,000.50"));
        let tx = normalizer.normalize_record(&rec).unwrap();
        assert_eq!(tx.total_amount, 120000.50);
    }

    #[test]
    fn accepts_alternate_date_formats() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.insert("transaction_date".to_string(), json!("01/03/2024"));
        let tx = normalizer.normalize_record(&rec).unwrap();
        assert_eq!(
            tx.transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn rejects_missing_required_field() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.remove("customer_name");
        let err = normalizer.normalize_record(&rec).unwrap_err();
        assert_eq!(err, MalformedRecord::MissingField(fields::CUSTOMER_NAME));
    }

    #[test]
    fn rejects_non_positive_quantity_and_amount() {
        let normalizer = SchemaNormalizer::default();

        let mut rec = good_record();
        rec.insert("quantity".to_string(), json!(0));
        match normalizer.normalize_record(&rec).unwrap_err() {
            MalformedRecord::NonPositive { field, .. } => assert_eq!(field, fields::QUANTITY),
            other => panic!("Expected NonPositive, got {other:?}"),
        }

        let mut rec = good_record();
        rec.insert("total_amount".to_string(), json!(-10.0));
        match normalizer.normalize_record(&rec).unwrap_err() {
            MalformedRecord::NonPositive { field, .. } => assert_eq!(field, fields::TOTAL_AMOUNT),
            other => panic!("Expected NonPositive, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparseable_date() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.insert("transaction_date".to_string(), json!("March the 1st"));
        match normalizer.normalize_record(&rec).unwrap_err() {
            MalformedRecord::InvalidDate { field, .. } => {
                assert_eq!(field, fields::TRANSACTION_DATE)
            }
            other => panic!("Expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_payment_status() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.insert("payment_status".to_string(), json!("maybe"));
        assert_eq!(
            normalizer.normalize_record(&rec).unwrap_err(),
            MalformedRecord::InvalidPaymentStatus("maybe".to_string())
        );
    }

    #[test]
    fn missing_cost_price_is_not_an_error() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.remove("cost_price");
        assert_eq!(normalizer.normalize_record(&rec).unwrap().cost_price, None);

        let mut rec = good_record();
        rec.insert("cost_price".to_string(), Value::Null);
        assert_eq!(normalizer.normalize_record(&rec).unwrap().cost_price, None);
    }

    #[test]
    fn batch_drops_duplicates_keeping_first() {
        let normalizer = SchemaNormalizer::default();
        let mut second = good_record();
        second.insert("quantity".to_string(), json!(99));
        let batch = normalizer.normalize_batch(&[good_record(), second], reference());

        assert_eq!(batch.accepted(), 1);
        assert_eq!(batch.rejected(), 1);
        assert_eq!(batch.transactions[0].quantity, 4.0);
        assert_eq!(batch.rejects[0].index, 1);
        assert_eq!(
            batch.rejects[0].reason,
            MalformedRecord::DuplicateTransactionId("TXN-001".to_string())
        );
    }

    #[test]
    fn batch_rejects_future_dated_rows() {
        let normalizer = SchemaNormalizer::default();
        let mut rec = good_record();
        rec.insert("transaction_date".to_string(), json!("2024-06-02"));
        let batch = normalizer.normalize_batch(&[rec], reference());
        assert_eq!(batch.accepted(), 0);
        assert_eq!(batch.rejects[0].reason, MalformedRecord::FutureDated);
    }

    #[test]
    fn one_bad_row_never_fails_the_batch() {
        let normalizer = SchemaNormalizer::default();
        let mut bad = good_record();
        bad.insert("transaction_id".to_string(), json!("TXN-002"));
        bad.insert("unit_price".to_string(), json!("not a price"));
        let batch = normalizer.normalize_batch(&[good_record(), bad], reference());
        assert_eq!(batch.accepted(), 1);
        assert_eq!(batch.rejected(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: normalize_batch is total — any combination of
            /// present/garbled fields lands in exactly one of the two
            /// output buckets, never a panic.
            #[test]
            fn batch_partitions_every_record(
                qty in -5.0f64..5.0,
                amount in -100.0f64..100.0,
                status in "[a-zA-Z]{0,10}",
            ) {
                let normalizer = SchemaNormalizer::default();
                let mut rec = good_record();
                rec.insert("quantity".to_string(), json!(qty));
                rec.insert("total_amount".to_string(), json!(amount));
                rec.insert("payment_status".to_string(), json!(status));

                let batch = normalizer.normalize_batch(&[rec], reference());
                prop_assert_eq!(batch.accepted() + batch.rejected(), 1);
            }
        }
    }
}
