//! Per-run analysis context.
//!
//! Every date comparison in a run (recency windows, overdue day counts,
//! alert timestamps) must use the same reference captured here, once, at
//! run start. Reading the clock ad hoc mid-computation would let the
//! reference drift across classifiers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RunId;

/// Immutable context for a single analysis run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Unique identifier of this run.
    pub run_id: RunId,
    /// The "today" every window and overdue calculation is measured against.
    pub reference_date: NaiveDate,
    /// Wall-clock instant the run was created; stamped onto every alert.
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    /// Capture a fresh context for the given reference date.
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            run_id: RunId::new(),
            reference_date,
            started_at: Utc::now(),
        }
    }

    /// Capture a context for "today" in UTC.
    pub fn today() -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            reference_date: now.date_naive(),
            started_at: now,
        }
    }

    /// Fully pinned context. Two runs over the same input with the same
    /// pinned context produce identical reports; tests rely on this.
    pub fn pinned(run_id: RunId, reference_date: NaiveDate, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            reference_date,
            started_at,
        }
    }

    /// Whole days elapsed from `date` to the reference date.
    ///
    /// Negative when `date` is after the reference (future-dated rows are
    /// rejected upstream, but the arithmetic stays well-defined).
    pub fn days_since(&self, date: NaiveDate) -> i64 {
        (self.reference_date - date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_since_counts_whole_days() {
        let ctx = RunContext::pinned(RunId::new(), date(2024, 3, 31), Utc::now());
        assert_eq!(ctx.days_since(date(2024, 3, 1)), 30);
        assert_eq!(ctx.days_since(date(2024, 3, 31)), 0);
        assert_eq!(ctx.days_since(date(2024, 4, 2)), -2);
    }
}
