//! `tradepulse-schema`
//!
//! **Responsibility:** the universal transaction schema and the normalizer
//! that maps heterogeneous ERP exports onto it.
//!
//! Upstream loaders (CSV readers, warehouse queries) hand this crate raw
//! string-keyed records; it hands back validated [`Transaction`] values and
//! a typed reject list. File and network I/O stay with the loaders.

pub mod normalizer;
pub mod transaction;

pub use normalizer::{
    FieldMapping, MalformedRecord, NormalizedBatch, RawRecord, RejectedRecord, SchemaNormalizer,
};
pub use transaction::{PaymentStatus, Transaction};
