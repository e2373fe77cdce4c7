//! `tradepulse-metrics`
//!
//! **Responsibility:** derived per-transaction metrics and the full-batch
//! customer/product aggregates the classifiers consume.
//!
//! Everything here is a pure function of the transaction set plus the run's
//! reference date. Aggregates are recomputed from scratch each run — no
//! incremental state, so a re-run over the same input is byte-identical.
//! Zero-valued denominators yield sentinels (0.0 or `None`), never errors.

pub mod customer;
pub mod derived;
pub mod product;

pub use customer::{CustomerAggregate, build_customer_aggregates};
pub use derived::DerivedFields;
pub use product::{ProductAggregate, build_product_aggregates};
