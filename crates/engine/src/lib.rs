//! `tradepulse-engine`
//!
//! **Responsibility:** composition root for one batch analysis run.
//!
//! Upstream loaders hand the engine transactions (or raw records plus a
//! normalizer); it recomputes the customer/product aggregates, runs the
//! three alert classifiers over that immutable snapshot, and returns an
//! [`AnalysisReport`]. The whole pass is deterministic for a fixed
//! [`tradepulse_core::RunContext`] — re-running is always safe.

pub mod analysis;
pub mod report;

pub use analysis::{AnalysisError, Analyzer};
pub use report::AnalysisReport;
