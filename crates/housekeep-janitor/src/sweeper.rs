//! Sweep engine: deleting images that have not been used recently

use crate::{JanitorError, SharedState, SweepReport};
use chrono::{DateTime, Utc};
use housekeep_domain::{EngineClient, ImageDeleteError};
use std::time::{Duration, Instant};

/// Deletes tracked images whose last use is older than a maximum age
///
/// A sweep never edits the state itself. Successful deletions come back
/// through the event stream as `image delete` events, and the processor
/// drops the entries then.
#[derive(Debug, Clone, Default)]
pub struct Sweeper {
    dry_run: bool,
}

impl Sweeper {
    /// Create a sweeper that deletes images
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sweeper that only reports what it would delete
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// True when deletions are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sweep with the current time as the clock
    pub async fn sweep<E>(
        &self,
        engine: &E,
        state: &SharedState,
        max_age: Duration,
    ) -> Result<SweepReport, JanitorError>
    where
        E: EngineClient + ?Sized,
    {
        self.sweep_at(engine, state, max_age, Utc::now()).await
    }

    /// Sweep as if the current time were `now`
    ///
    /// Missing images and refused deletions are logged and the sweep moves
    /// on. Any other engine failure aborts the pass.
    pub async fn sweep_at<E>(
        &self,
        engine: &E,
        state: &SharedState,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, JanitorError>
    where
        E: EngineClient + ?Sized,
    {
        let start = Instant::now();

        // An age beyond the representable range leaves nothing stale
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
        else {
            tracing::info!(max_age = ?max_age, "Maximum age exceeds the clock range, nothing to sweep");
            return Ok(SweepReport::default());
        };

        let mut report = SweepReport::new(cutoff);

        let mut stale = {
            let state = state.lock().await;
            report.skipped_fresh = state.len();
            state.stale_images(cutoff)
        };
        report.skipped_fresh -= stale.len();
        stale.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        tracing::info!(
            cutoff = %cutoff,
            stale = stale.len(),
            fresh = report.skipped_fresh,
            dry_run = self.dry_run,
            "Starting sweep"
        );

        for (image, last_used) in stale {
            if self.dry_run {
                tracing::info!(image = %image, last_used = %last_used, "Would delete image (dry run)");
                report.dry_run.push(image);
                continue;
            }

            match engine.delete_image(&image).await {
                Ok(items) => {
                    tracing::info!(
                        image = %image,
                        last_used = %last_used,
                        removed = items.len(),
                        "Deleted image"
                    );
                    report.deleted.push(image);
                }
                Err(ImageDeleteError::NotFound { message }) => {
                    tracing::warn!(image = %image, reason = %message, "Image is already gone");
                    report.not_found.push(image);
                }
                Err(ImageDeleteError::Conflict { message }) => {
                    tracing::error!(image = %image, reason = %message, "Engine refused to delete image");
                    report.conflicts.push((image, message));
                }
                Err(source) => {
                    return Err(JanitorError::ImageDelete { image, source });
                }
            }
        }

        report.runtime = start.elapsed();
        tracing::info!(
            deleted = report.deleted.len(),
            not_found = report.not_found.len(),
            conflicts = report.conflicts.len(),
            "Sweep finished in {:?}",
            report.runtime
        );

        Ok(report)
    }
}
