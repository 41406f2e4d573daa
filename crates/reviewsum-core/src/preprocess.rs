//! Review text cleanup applied before prompt building.

use std::collections::HashSet;

/// Clean a raw sequence of review strings.
///
/// Absent entries and entries that are empty after trimming are dropped,
/// the rest are trimmed, and exact duplicates are removed. Output keeps
/// first-occurrence order, so the same input always yields the same prompt
/// context.
pub fn clean<I, S>(reviews: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for review in reviews.into_iter().flatten() {
        let trimmed = review.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            cleaned.push(trimmed.to_string());
        }
    }

    cleaned
}
