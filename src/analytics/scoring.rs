//! Popularity scoring from page view rows.
//!
//! Raw traffic is the base signal, session duration and engagement add a
//! quality bonus, and bounce rate subtracts in proportion to traffic.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::analytics::{article_id_from_path, PageViewRow};

/// Realtime active users above which an article is trending.
pub const TRENDING_ACTIVE_USERS: f64 = 5.0;

/// Score bonus per realtime active user for trending articles.
pub const TRENDING_BONUS_PER_USER: f64 = 20.0;

/// Per-article metrics derived for one ranking computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularityMetrics {
    pub article_id: String,
    pub page_views: u64,
    pub unique_views: u64,
    pub average_time: f64,
    pub bounce_rate: f64,
    pub popularity_score: f64,
    pub trending: bool,
}

/// Popularity score of a single row, never negative.
///
/// ```text
/// score = pageViews + 0.1*avgSessionDuration + 10*engagementRate - 0.1*bounceRate*pageViews
/// ```
pub fn popularity_score(row: &PageViewRow) -> f64 {
    let page_views = row.page_views as f64;
    let base = page_views;
    let quality_bonus = row.avg_session_duration * 0.1 + row.engagement_rate * 10.0;
    let penalty = row.bounce_rate * page_views * 0.1;
    (base + quality_bonus - penalty).max(0.0)
}

/// Metrics keyed by article id from historical rows.
///
/// Rows for unknown articles are dropped. When several paths map to the same
/// article, the first (most viewed) row wins.
pub fn historical_metrics(
    rows: &[PageViewRow],
    article_ids: &[String],
) -> BTreeMap<String, PopularityMetrics> {
    let known: HashSet<&str> = article_ids.iter().map(String::as_str).collect();
    let mut metrics = BTreeMap::new();

    for row in rows {
        let Some(id) = article_id_from_path(&row.path).filter(|id| known.contains(id)) else {
            continue;
        };
        metrics
            .entry(id.to_string())
            .or_insert_with(|| PopularityMetrics {
                article_id: id.to_string(),
                page_views: row.page_views,
                unique_views: row.unique_views,
                average_time: row.avg_session_duration,
                bounce_rate: row.bounce_rate,
                popularity_score: popularity_score(row),
                trending: false,
            });
    }

    metrics
}

/// Return a copy of `metrics` with the realtime trending flag and bonus applied.
///
/// Only articles present in both inputs are touched, each at most once.
pub fn with_realtime_trending(
    metrics: &BTreeMap<String, PopularityMetrics>,
    realtime: &[PageViewRow],
) -> BTreeMap<String, PopularityMetrics> {
    let mut updated = metrics.clone();
    let mut seen: HashSet<&str> = HashSet::new();

    for row in realtime {
        let Some(id) = article_id_from_path(&row.path) else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        let Some(entry) = updated.get_mut(id) else {
            continue;
        };

        entry.trending = row.engagement_rate > TRENDING_ACTIVE_USERS;
        if entry.trending {
            entry.popularity_score += row.engagement_rate * TRENDING_BONUS_PER_USER;
        }
    }

    updated
}

/// Full scoring pass: historical metrics, realtime trending, sorted by descending score.
pub fn popularity_metrics(
    historical: &[PageViewRow],
    realtime: &[PageViewRow],
    article_ids: &[String],
) -> Vec<PopularityMetrics> {
    let base = historical_metrics(historical, article_ids);
    let mut metrics: Vec<PopularityMetrics> =
        with_realtime_trending(&base, realtime).into_values().collect();
    metrics.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
    metrics
}
