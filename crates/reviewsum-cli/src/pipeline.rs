//! Per-entity summary pipeline: fetch, clean, generate, persist.
//!
//! Every id is processed in isolation. A failure for one id is logged and
//! recorded in the [`RunReport`]; it never stops the remaining ids.

use std::future::Future;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use reviewsum_core::{AppConfig, BatchError, EntityId, ReviewBatch, ReviewRecord};
use reviewsum_db::{DbError, ReviewRepository};
use reviewsum_llm::{
    retry_with_backoff, CompletionClient, GenerationError, SummaryGenerator, TokenEstimator,
};

use crate::report::{EntityOutcome, FailureReason, RunReport, SkipReason};

/// Read and write access to reviews and summaries.
pub(crate) trait ReviewStore {
    fn list_ids(&self) -> impl Future<Output = Vec<EntityId>>;

    /// `Ok(None)` when the id has no rows; `Err` when the store could not
    /// answer.
    fn fetch_records(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Vec<ReviewRecord>>, DbError>>;

    fn store_summary(&self, id: &EntityId, summary: &str) -> impl Future<Output = bool>;
}

impl ReviewStore for ReviewRepository {
    fn list_ids(&self) -> impl Future<Output = Vec<EntityId>> {
        self.list_distinct_ids()
    }

    async fn fetch_records(&self, id: &EntityId) -> Result<Option<Vec<ReviewRecord>>, DbError> {
        let records = self.try_fetch_ratings_and_reviews(id).await?;
        Ok(Some(records).filter(|records| !records.is_empty()))
    }

    fn store_summary(&self, id: &EntityId, summary: &str) -> impl Future<Output = bool> {
        self.write_summary(id, summary)
    }
}

/// Turns a review batch into summary text.
pub(crate) trait Summarizer {
    fn summarize(
        &self,
        batch: &ReviewBatch,
    ) -> impl Future<Output = Result<String, GenerationError>>;
}

impl<C, T> Summarizer for SummaryGenerator<C, T>
where
    C: CompletionClient,
    T: TokenEstimator,
{
    fn summarize(
        &self,
        batch: &ReviewBatch,
    ) -> impl Future<Output = Result<String, GenerationError>> {
        self.generate(&batch.reviews, batch.total_count, batch.average_rating)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PipelineOptions {
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub dry_run: bool,
}

impl PipelineOptions {
    pub(crate) fn from_app_config(config: &AppConfig, dry_run: bool) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            max_retries: config.llm.max_retries,
            retry_backoff_base_ms: config.llm.retry_backoff_base_ms,
            dry_run,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            max_retries: 0,
            retry_backoff_base_ms: 0,
            dry_run: false,
        }
    }
}

/// Resolve the ids to process: the explicit list when given, otherwise every
/// id in the reviews table.
pub(crate) async fn resolve_ids<S: ReviewStore>(
    store: &S,
    requested: Vec<String>,
) -> Vec<EntityId> {
    if requested.is_empty() {
        store.list_ids().await
    } else {
        requested.into_iter().map(EntityId::from).collect()
    }
}

/// Run the pipeline over `ids`, at most `options.max_concurrency` at a time.
///
/// The report lists outcomes in the same order as `ids`.
pub(crate) async fn run_pipeline<S, Z>(
    store: &S,
    summarizer: &Z,
    ids: Vec<EntityId>,
    options: &PipelineOptions,
) -> RunReport
where
    S: ReviewStore,
    Z: Summarizer,
{
    let started_at = Utc::now();
    tracing::info!(
        ids = ids.len(),
        concurrency = options.max_concurrency,
        dry_run = options.dry_run,
        "starting summary run"
    );

    let entries: Vec<(EntityId, EntityOutcome)> = stream::iter(ids)
        .map(move |id| async move {
            let outcome = process_entity(store, summarizer, &id, options).await;
            (id, outcome)
        })
        .buffered(options.max_concurrency.max(1))
        .collect()
        .await;

    RunReport {
        started_at,
        finished_at: Utc::now(),
        entries,
    }
}

async fn process_entity<S, Z>(
    store: &S,
    summarizer: &Z,
    id: &EntityId,
    options: &PipelineOptions,
) -> EntityOutcome
where
    S: ReviewStore,
    Z: Summarizer,
{
    tracing::info!(id = %id, "generating summary");

    let records = match store.fetch_records(id).await {
        Ok(Some(records)) => records,
        Ok(None) => {
            tracing::warn!(id = %id, "no reviews found; skipping");
            return EntityOutcome::Skipped(SkipReason::NoRows);
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "failed to fetch reviews");
            return EntityOutcome::Failed(FailureReason::Fetch(e.to_string()));
        }
    };

    let batch = match ReviewBatch::from_records(records) {
        Ok(batch) => batch,
        Err(BatchError::NoData) => {
            tracing::warn!(id = %id, "reviews carry no ratings; skipping");
            return EntityOutcome::Skipped(SkipReason::NoRatings);
        }
    };

    tracing::debug!(
        id = %id,
        total_count = batch.total_count,
        average_rating = %batch.average_rating,
        unique_reviews = batch.reviews.len(),
        "review batch prepared"
    );

    if options.dry_run {
        return EntityOutcome::Previewed {
            total_count: batch.total_count,
            average_rating: batch.average_rating,
            review_count: batch.reviews.len(),
        };
    }

    let batch_ref = &batch;
    let summary = match retry_with_backoff(
        options.max_retries,
        options.retry_backoff_base_ms,
        move || summarizer.summarize(batch_ref),
    )
    .await
    {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(id = %id, error = %e, "summary generation failed");
            return EntityOutcome::Failed(FailureReason::Generation(e.to_string()));
        }
    };

    if !store.store_summary(id, &summary).await {
        return EntityOutcome::Failed(FailureReason::Persist);
    }

    tracing::info!(id = %id, words = summary.split_whitespace().count(), "summary stored");
    EntityOutcome::Succeeded
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
