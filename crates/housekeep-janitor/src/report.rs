//! Outcome reporting for sweep passes

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of a single sweep pass
///
/// Tracks which stale images were deleted, skipped or refused by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Boundary used for the pass; images last used before it were stale
    pub cutoff: Option<DateTime<Utc>>,

    /// Tracked images whose last use is at or after the cutoff
    pub skipped_fresh: usize,

    /// Images the engine deleted
    pub deleted: Vec<String>,

    /// Images the engine no longer knew about
    pub not_found: Vec<String>,

    /// Images the engine refused to delete, with its reason
    pub conflicts: Vec<(String, String)>,

    /// Stale images left alone because of dry-run mode
    pub dry_run: Vec<String>,

    /// Wall time spent in the pass
    pub runtime: Duration,
}

impl SweepReport {
    /// Create an empty report for a pass with the given cutoff
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff: Some(cutoff),
            ..Default::default()
        }
    }

    /// Number of stale images the pass looked at
    pub fn stale(&self) -> usize {
        self.deleted.len() + self.not_found.len() + self.conflicts.len() + self.dry_run.len()
    }

    /// Generate a summary report of the pass
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Sweep Summary".to_string(),
            "=============".to_string(),
        ];

        if let Some(cutoff) = self.cutoff {
            lines.push(format!("Cutoff: {}", cutoff.to_rfc3339()));
        }
        lines.push(format!("Stale images: {}", self.stale()));
        lines.push(format!("Fresh images kept: {}", self.skipped_fresh));
        lines.push(format!("Deleted: {}", self.deleted.len()));

        if !self.not_found.is_empty() {
            lines.push(format!("Already gone: {}", self.not_found.len()));
        }

        if !self.conflicts.is_empty() {
            lines.push(format!("Refused: {}", self.conflicts.len()));
            for (image, reason) in &self.conflicts {
                lines.push(format!("  {}: {}", image, reason));
            }
        }

        if !self.dry_run.is_empty() {
            lines.push(format!("Would delete (dry run): {}", self.dry_run.len()));
            for image in &self.dry_run {
                lines.push(format!("  {}", image));
            }
        }

        lines.push(format!("Runtime: {}ms", self.runtime.as_millis()));
        lines.join("\n")
    }
}

/// Running totals across the sweeps of a watch session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepTotals {
    /// Completed sweep passes
    pub sweep_count: usize,

    /// Images deleted across all passes
    pub deleted: usize,

    /// Images already gone across all passes
    pub not_found: usize,

    /// Deletions refused across all passes
    pub conflicts: usize,
}

impl SweepTotals {
    /// Create empty totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a completed pass into the totals
    pub fn record(&mut self, report: &SweepReport) {
        self.sweep_count += 1;
        self.deleted += report.deleted.len();
        self.not_found += report.not_found.len();
        self.conflicts += report.conflicts.len();
    }

    /// One-line rendering for logs
    pub fn summary(&self) -> String {
        format!(
            "{} sweeps, {} deleted, {} already gone, {} refused",
            self.sweep_count, self.deleted, self.not_found, self.conflicts
        )
    }
}
