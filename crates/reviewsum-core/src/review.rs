use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::preprocess::clean;

/// Identifier of a reviewed entity (an academy).
///
/// Read back from the store as text so integer and string keys are handled
/// the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// One row of the reviews table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub rating: Option<Decimal>,
    pub review_text: Option<String>,
}

impl ReviewRecord {
    #[must_use]
    pub fn new(rating: Option<Decimal>, review_text: Option<&str>) -> Self {
        Self {
            rating,
            review_text: review_text.map(ToString::to_string),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("no rated reviews available")]
    NoData,
}

/// Cleaned reviews plus the aggregate statistics sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewBatch {
    pub reviews: Vec<String>,
    /// Number of rating entries, counted before review text is cleaned.
    pub total_count: usize,
    /// Mean rating rounded to 2 decimal places.
    pub average_rating: Decimal,
}

impl ReviewBatch {
    /// Build a batch from the raw rows of one entity.
    ///
    /// `total_count` and `average_rating` are derived from the ratings only;
    /// review text is cleaned independently, so a row with a rating and a
    /// blank review still counts toward the statistics.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::NoData`] if no record carries a rating.
    pub fn from_records(records: Vec<ReviewRecord>) -> Result<Self, BatchError> {
        let ratings: Vec<Decimal> = records.iter().filter_map(|r| r.rating).collect();
        let average_rating = average_rating(&ratings).ok_or(BatchError::NoData)?;

        let reviews = clean(records.into_iter().map(|r| r.review_text));

        Ok(Self {
            reviews,
            total_count: ratings.len(),
            average_rating,
        })
    }
}

/// Arithmetic mean rounded to 2 decimal places, `None` for an empty slice.
#[must_use]
pub fn average_rating(ratings: &[Decimal]) -> Option<Decimal> {
    if ratings.is_empty() {
        return None;
    }
    let sum: Decimal = ratings.iter().sum();
    let mean = sum / Decimal::from(ratings.len());
    Some(mean.round_dp(2).normalize())
}
