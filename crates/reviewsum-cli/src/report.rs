//! Per-entity outcomes and the aggregated run report.

use chrono::{DateTime, Utc};
use reviewsum_core::EntityId;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SkipReason {
    /// The store returned no review rows for the id.
    NoRows,
    /// Rows exist but none carries a rating.
    NoRatings,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoRows => write!(f, "no review rows"),
            SkipReason::NoRatings => write!(f, "no rated reviews"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FailureReason {
    /// The store could not be read for this id.
    Fetch(String),
    Generation(String),
    Persist,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Fetch(message) => write!(f, "reviews could not be fetched: {message}"),
            FailureReason::Generation(message) => write!(f, "summary generation failed: {message}"),
            FailureReason::Persist => write!(f, "summary could not be stored"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntityOutcome {
    Succeeded,
    /// `--dry-run`: statistics computed, nothing generated or written.
    Previewed {
        total_count: usize,
        average_rating: Decimal,
        review_count: usize,
    },
    Skipped(SkipReason),
    Failed(FailureReason),
}

#[derive(Debug, Clone)]
pub(crate) struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per processed id, in listing order.
    pub entries: Vec<(EntityId, EntityOutcome)>,
}

impl RunReport {
    pub(crate) fn succeeded(&self) -> impl Iterator<Item = &EntityId> {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, EntityOutcome::Succeeded))
            .map(|(id, _)| id)
    }

    pub(crate) fn skipped(&self) -> impl Iterator<Item = (&EntityId, &SkipReason)> {
        self.entries.iter().filter_map(|(id, outcome)| match outcome {
            EntityOutcome::Skipped(reason) => Some((id, reason)),
            _ => None,
        })
    }

    pub(crate) fn failed(&self) -> impl Iterator<Item = (&EntityId, &FailureReason)> {
        self.entries.iter().filter_map(|(id, outcome)| match outcome {
            EntityOutcome::Failed(reason) => Some((id, reason)),
            _ => None,
        })
    }

    pub(crate) fn previewed(&self) -> impl Iterator<Item = (&EntityId, &EntityOutcome)> {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, EntityOutcome::Previewed { .. }))
            .map(|(id, outcome)| (id, outcome))
    }

    pub(crate) fn log_summary(&self) {
        let failed = self.failed().count();
        let elapsed_secs = (self.finished_at - self.started_at).num_seconds();
        if failed > 0 {
            tracing::warn!(
                total = self.entries.len(),
                succeeded = self.succeeded().count(),
                skipped = self.skipped().count(),
                failed,
                elapsed_secs,
                "summary run finished with failures"
            );
        } else {
            tracing::info!(
                total = self.entries.len(),
                succeeded = self.succeeded().count(),
                skipped = self.skipped().count(),
                elapsed_secs,
                "summary run finished"
            );
        }
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "summary run: {} ids, {} succeeded, {} skipped, {} failed",
            self.entries.len(),
            self.succeeded().count(),
            self.skipped().count(),
            self.failed().count()
        )?;
        for (id, outcome) in self.previewed() {
            if let EntityOutcome::Previewed {
                total_count,
                average_rating,
                review_count,
            } = outcome
            {
                writeln!(
                    f,
                    "  preview {id}: {total_count} ratings, average {average_rating}, {review_count} unique reviews"
                )?;
            }
        }
        for (id, reason) in self.skipped() {
            writeln!(f, "  skipped {id}: {reason}")?;
        }
        for (id, reason) in self.failed() {
            writeln!(f, "  failed {id}: {reason}")?;
        }
        Ok(())
    }
}
