//! Queries against the reviews table and the summary destination table.

use reviewsum_core::{EntityId, ReviewRecord};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::{quote_identifier, DbError};

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A `(Rating, Review)` pair from the reviews table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub rating: Option<Decimal>,
    pub review: Option<String>,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            rating: row.rating,
            review_text: row.review,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Return every distinct non-null value of `column` in `table`.
///
/// Values are cast to text so integer and string keys decode the same way.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] for a malformed table or column
/// name, [`DbError::Connection`] if the store is unreachable, and
/// [`DbError::Query`] if the statement fails.
pub async fn list_distinct_ids(
    pool: &MySqlPool,
    table: &str,
    column: &str,
) -> Result<Vec<EntityId>, DbError> {
    let table = quote_identifier(table)?;
    let column = quote_identifier(column)?;

    let sql = format!(
        "SELECT DISTINCT CAST({column} AS CHAR) FROM {table} WHERE {column} IS NOT NULL"
    );
    let ids = sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(ids.into_iter().map(EntityId::from).collect())
}

/// Fetch every `(Rating, Review)` row whose `id_column` equals `id`.
///
/// An empty vector means no row matched.
///
/// # Errors
///
/// Same as [`list_distinct_ids`].
pub async fn fetch_ratings_and_reviews(
    pool: &MySqlPool,
    table: &str,
    id_column: &str,
    id: &EntityId,
) -> Result<Vec<ReviewRecord>, DbError> {
    let table = quote_identifier(table)?;
    let id_column = quote_identifier(id_column)?;

    let sql = format!(
        "SELECT CAST(`Rating` AS DECIMAL(10, 4)) AS rating, `Review` AS review \
         FROM {table} \
         WHERE {id_column} = ?"
    );
    let rows = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(id.as_str())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(ReviewRecord::from).collect())
}

/// Overwrite `review_summary` for the row of `summary_table` keyed by `id`.
///
/// Runs inside a transaction that is committed before returning. Returns the
/// number of matched rows; the MySQL driver negotiates `CLIENT_FOUND_ROWS`,
/// so 0 means no destination row exists for `id`.
///
/// # Errors
///
/// Same as [`list_distinct_ids`]. The transaction is rolled back on drop if
/// the update or commit fails.
pub async fn write_summary(
    pool: &MySqlPool,
    summary_table: &str,
    id: &EntityId,
    summary: &str,
) -> Result<u64, DbError> {
    let summary_table = quote_identifier(summary_table)?;
    let sql = format!("UPDATE {summary_table} SET `review_summary` = ? WHERE `id` = ?");

    let mut tx = pool.begin().await?;
    let result = sqlx::query(&sql)
        .bind(summary)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(result.rows_affected())
}
