//! The analysis run: aggregate once, classify three ways.

use thiserror::Error;
use tracing::info;

use tradepulse_alerts::{classify_credit_risk, classify_dead_stock, classify_low_margin};
use tradepulse_config::{ConfigError, RuleConfig, RuleThresholds};
use tradepulse_core::RunContext;
use tradepulse_metrics::{build_customer_aggregates, build_product_aggregates};
use tradepulse_schema::{RawRecord, SchemaNormalizer, Transaction};

use crate::report::AnalysisReport;

/// Failure to set up an analysis run.
///
/// Configuration problems are fatal by design: silently falling back to
/// defaults would misclassify severity, so the analyzer refuses to exist.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
}

/// A configured, validated analysis pipeline.
///
/// Construction validates the whole configuration up front; a constructed
/// `Analyzer` can therefore never fail mid-run. The three classifiers read
/// the same immutable aggregate snapshot and share no state, so their
/// evaluation order is irrelevant.
#[derive(Debug, Clone)]
pub struct Analyzer {
    thresholds: RuleThresholds,
}

impl Analyzer {
    /// Build an analyzer on the configuration's default thresholds.
    pub fn new(config: &RuleConfig) -> Result<Self, AnalysisError> {
        Self::for_industry(config, None)
    }

    /// Build an analyzer with an industry's benchmark overrides applied.
    pub fn for_industry(
        config: &RuleConfig,
        industry: Option<&str>,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            thresholds: config.resolve(industry),
        })
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Run one full analysis pass over normalized transactions.
    ///
    /// Total over well-formed input and idempotent: the same transactions
    /// and the same context produce an identical report.
    pub fn analyze(&self, transactions: &[Transaction], ctx: &RunContext) -> AnalysisReport {
        let customers = build_customer_aggregates(transactions, ctx.reference_date);
        let products = build_product_aggregates(transactions, ctx.reference_date);
        info!(
            run_id = %ctx.run_id,
            transactions = transactions.len(),
            customers = customers.len(),
            products = products.len(),
            "aggregates built"
        );

        let dead_stock = classify_dead_stock(&products, &self.thresholds, ctx);
        let low_margin = classify_low_margin(transactions, &products, &self.thresholds, ctx);
        let credit_risk = classify_credit_risk(transactions, &customers, &self.thresholds, ctx);
        info!(
            run_id = %ctx.run_id,
            dead_stock = dead_stock.len(),
            low_margin = low_margin.len(),
            credit_risk = credit_risk.len(),
            "classification complete"
        );

        AnalysisReport {
            run_id: ctx.run_id,
            analysis_date: ctx.reference_date,
            generated_at: ctx.started_at,
            transactions_analyzed: transactions.len(),
            records_rejected: 0,
            dead_stock,
            low_margin,
            credit_risk,
        }
    }

    /// Normalize raw source records, then analyze whatever survives.
    ///
    /// Malformed records are excluded, counted and logged — never fatal.
    pub fn analyze_records(
        &self,
        records: &[RawRecord],
        normalizer: &SchemaNormalizer,
        ctx: &RunContext,
    ) -> AnalysisReport {
        let batch = normalizer.normalize_batch(records, ctx.reference_date);
        if batch.rejected() > 0 {
            info!(
                run_id = %ctx.run_id,
                accepted = batch.accepted(),
                rejected = batch.rejected(),
                "normalization dropped malformed records"
            );
        }

        let mut report = self.analyze(&batch.transactions, ctx);
        report.records_rejected = batch.rejected();
        report
    }
}
