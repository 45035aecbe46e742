//! Display helpers for article cards and the ranking page.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::content::models::Article;

/// Alt text for the cover image: `cover_alt`, then the legacy `covert_alt`, then the title.
pub fn image_alt(article: &Article) -> &str {
    article
        .data
        .cover_alt
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| article.data.covert_alt.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or(&article.data.title)
}

/// Border classes for the rank badge.
pub fn rank_badge_color(rank: usize) -> &'static str {
    match rank {
        1 => "border-r-yellow-500 border-t-yellow-500",
        2 => "border-r-gray-500 border-t-gray-500",
        3 => "border-r-orange-500 border-t-orange-500",
        _ => "border-r-blue-500 border-t-blue-500",
    }
}

pub fn article_url(article_id: &str) -> String {
    format!("/articles/{article_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Seven-day window ending `weeks_back` weeks before `now`, formatted like `2025/3/9`.
pub fn week_date_range(now: DateTime<Utc>, weeks_back: u32) -> DateRange {
    let end = now - Duration::days(i64::from(weeks_back) * 7);
    let start = end - Duration::days(7);
    DateRange {
        start: start.format("%Y/%-m/%-d").to_string(),
        end: end.format("%Y/%-m/%-d").to_string(),
    }
}
