//! Degrade-on-error facade over the review queries.
//!
//! The pipeline treats the store as best-effort: failed reads become empty
//! results and failed writes become `false`, with the error logged here.
//! Callers that need the error use the `try_*` methods.

use reviewsum_core::{AppConfig, EntityId, ReviewRecord};
use sqlx::MySqlPool;

use crate::{reviews, DbError};

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: MySqlPool,
    review_table: String,
    id_column: String,
    summary_table: String,
}

impl ReviewRepository {
    #[must_use]
    pub fn new(
        pool: MySqlPool,
        review_table: impl Into<String>,
        id_column: impl Into<String>,
        summary_table: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            review_table: review_table.into(),
            id_column: id_column.into(),
            summary_table: summary_table.into(),
        }
    }

    #[must_use]
    pub fn from_app_config(pool: MySqlPool, config: &AppConfig) -> Self {
        Self::new(
            pool,
            &config.review_table,
            &config.review_id_column,
            &config.summary_table,
        )
    }

    /// # Errors
    ///
    /// See [`reviews::list_distinct_ids`].
    pub async fn try_list_distinct_ids(&self) -> Result<Vec<EntityId>, DbError> {
        reviews::list_distinct_ids(&self.pool, &self.review_table, &self.id_column).await
    }

    /// # Errors
    ///
    /// See [`reviews::fetch_ratings_and_reviews`].
    pub async fn try_fetch_ratings_and_reviews(
        &self,
        id: &EntityId,
    ) -> Result<Vec<ReviewRecord>, DbError> {
        reviews::fetch_ratings_and_reviews(&self.pool, &self.review_table, &self.id_column, id)
            .await
    }

    /// # Errors
    ///
    /// See [`reviews::write_summary`].
    pub async fn try_write_summary(&self, id: &EntityId, summary: &str) -> Result<u64, DbError> {
        reviews::write_summary(&self.pool, &self.summary_table, id, summary).await
    }

    /// Every distinct entity id in the reviews table, or an empty vector if
    /// the store cannot be queried.
    pub async fn list_distinct_ids(&self) -> Vec<EntityId> {
        match self.try_list_distinct_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(
                    table = %self.review_table,
                    column = %self.id_column,
                    error = %e,
                    "failed to list entity ids; continuing with none"
                );
                Vec::new()
            }
        }
    }

    /// All review rows for `id`. `None` when nothing matched or the query
    /// failed; `Some` always holds at least one record.
    pub async fn fetch_ratings_and_reviews(&self, id: &EntityId) -> Option<Vec<ReviewRecord>> {
        match self.try_fetch_ratings_and_reviews(id).await {
            Ok(records) if records.is_empty() => None,
            Ok(records) => Some(records),
            Err(e) => {
                tracing::error!(
                    id = %id,
                    table = %self.review_table,
                    error = %e,
                    "failed to fetch reviews"
                );
                None
            }
        }
    }

    /// Store `summary` for `id`. Returns `false` when the update fails or
    /// when the destination table has no row for `id`.
    pub async fn write_summary(&self, id: &EntityId, summary: &str) -> bool {
        match self.try_write_summary(id, summary).await {
            Ok(0) => {
                tracing::warn!(
                    id = %id,
                    table = %self.summary_table,
                    "no destination row for id; summary not stored"
                );
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    id = %id,
                    table = %self.summary_table,
                    error = %e,
                    "failed to write summary"
                );
                false
            }
        }
    }
}
