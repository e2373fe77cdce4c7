//! The output of one analysis run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tradepulse_alerts::{Alert, CreditRiskAlert, DeadStockAlert, LowMarginAlert};
use tradepulse_core::RunId;

/// Everything a delivery collaborator needs from one run: the three ordered
/// alert lists plus run metadata. Serializes to JSON as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub run_id: RunId,
    pub analysis_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub transactions_analyzed: usize,
    /// Source records dropped by normalization (0 when the caller supplied
    /// already-normalized transactions).
    pub records_rejected: usize,
    pub dead_stock: Vec<DeadStockAlert>,
    pub low_margin: Vec<LowMarginAlert>,
    pub credit_risk: Vec<CreditRiskAlert>,
}

impl AnalysisReport {
    pub fn total_alerts(&self) -> usize {
        self.dead_stock.len() + self.low_margin.len() + self.credit_risk.len()
    }

    /// True when nothing urgent came out of the run — the "all systems
    /// running smoothly" case a daily digest can short-circuit on.
    pub fn is_all_clear(&self) -> bool {
        self.iter_alerts().all(|a| !a.severity().is_urgent())
    }

    /// The digest view: urgent alerts of every type merged, ranked by
    /// severity then headline metric (largest first), truncated to `limit`.
    pub fn top_alerts(&self, limit: usize) -> Vec<Alert> {
        let mut merged: Vec<Alert> = self
            .iter_alerts()
            .filter(|a| a.severity().is_urgent())
            .collect();
        merged.sort_by(|a, b| {
            a.severity()
                .cmp(&b.severity())
                .then(b.headline_metric().total_cmp(&a.headline_metric()))
                .then_with(|| a.entity_id().cmp(b.entity_id()))
        });
        merged.truncate(limit);
        merged
    }

    fn iter_alerts(&self) -> impl Iterator<Item = Alert> + '_ {
        self.dead_stock
            .iter()
            .cloned()
            .map(Alert::DeadStock)
            .chain(self.low_margin.iter().cloned().map(Alert::LowMargin))
            .chain(self.credit_risk.iter().cloned().map(Alert::CreditRisk))
    }
}
