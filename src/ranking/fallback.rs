//! Traffic-independent cold-start score.
//!
//! Favors recently published articles and articles near the front of the
//! newest-first listing.

use chrono::{DateTime, Utc};

/// Whole days elapsed since publication.
pub fn days_since_publish(published: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - published).num_days()
}

/// Score for the article at zero-based `index` of the newest-first list, published `days` ago.
///
/// ```text
/// recency  = d <= 14 ? 100 - 3d : 50 - 0.5d
/// position = max(0, 100 - 2i)
/// score    = max(0, recency + position)
/// ```
pub fn fallback_score(days: i64, index: usize) -> f64 {
    let d = days as f64;
    let recency = if days <= 14 { 100.0 - 3.0 * d } else { 50.0 - 0.5 * d };
    let position = (100.0 - 2.0 * index as f64).max(0.0);
    (recency + position).max(0.0)
}
