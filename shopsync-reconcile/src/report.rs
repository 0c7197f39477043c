//! Final run report and the exit-code tolerance policy.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::apply::ApplyReport;
use crate::diff::Diff;

/// Everything one run produced. Never persisted; the scheduler's logs are
/// the only record.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub local_count: usize,
    pub remote_count: usize,
    pub diff: Diff,
    pub apply: ApplyReport,
}

impl RunReport {
    /// Partial failure is acceptable by default: with no limit configured
    /// the run exits successfully regardless of per-item failures. A
    /// configured limit makes the run fail once failures exceed it.
    pub fn within_tolerance(&self, max_failures: Option<usize>) -> bool {
        match max_failures {
            None => true,
            Some(limit) => self.apply.failed() <= limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
