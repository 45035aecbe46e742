//! Rising-article detection: last day of traffic vs the weekly daily average.

use std::collections::HashMap;

use crate::analytics::{article_id_from_path, PageViewRow};

/// Today's views must exceed this multiple of the weekly daily average.
pub const TREND_RATIO_THRESHOLD: f64 = 2.0;

pub const MAX_RISING_ARTICLES: usize = 10;

/// Ratio of today's views to the 7-day daily average (floored at 1 view/day).
pub fn trend_score(today_views: u64, week_views: u64) -> f64 {
    let daily_avg = week_views as f64 / 7.0;
    today_views as f64 / daily_avg.max(1.0)
}

/// Article ids rising fastest, at most [`MAX_RISING_ARTICLES`].
///
/// Paths without a 7-day entry are skipped.
pub fn rising_articles(today: &[PageViewRow], week: &[PageViewRow]) -> Vec<String> {
    let mut week_by_path: HashMap<&str, &PageViewRow> = HashMap::new();
    for row in week {
        week_by_path.entry(row.path.as_str()).or_insert(row);
    }

    let mut scored: Vec<(&str, f64)> = today
        .iter()
        .filter_map(|row| {
            let id = article_id_from_path(&row.path)?;
            let week_row = week_by_path.get(row.path.as_str())?;
            let score = trend_score(row.page_views, week_row.page_views);
            (score > TREND_RATIO_THRESHOLD).then_some((id, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(MAX_RISING_ARTICLES)
        .map(|(id, _)| id.to_string())
        .collect()
}
