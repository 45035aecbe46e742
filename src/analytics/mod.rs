//! Article popularity from Google Analytics 4.
//!
//! `MetricsSource` is the seam to the reporting API; `AnalyticsService`
//! combines historical and realtime reports into per-article popularity
//! metrics, detects rising articles and builds the view-count snapshot.

pub mod ga4;
pub mod scoring;
pub mod snapshot;
pub mod trend;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::analytics::scoring::PopularityMetrics;
use crate::analytics::snapshot::ViewsSnapshot;

/// Path segment every article page lives under.
pub const ARTICLE_PATH_PREFIX: &str = "/articles/";

/// Page views estimated per realtime active user.
///
/// A heuristic, not a measurement: realtime reports only expose active users.
pub const REALTIME_PAGE_VIEW_ESTIMATE: u64 = 10;

/// One path's metrics over one query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewRow {
    pub path: String,
    pub page_views: u64,
    pub unique_views: u64,
    /// Seconds.
    pub avg_session_duration: f64,
    pub bounce_rate: f64,
    /// Engagement rate for historical rows, active users for realtime rows.
    pub engagement_rate: f64,
}

impl PageViewRow {
    /// Shape a realtime active-user count into a row.
    pub fn from_active_users(path: String, active_users: u64) -> Self {
        Self {
            path,
            page_views: active_users * REALTIME_PAGE_VIEW_ESTIMATE,
            unique_views: active_users,
            avg_session_duration: 0.0,
            bounce_rate: 0.0,
            engagement_rate: active_users as f64,
        }
    }
}

/// Site-wide view count for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathViews {
    pub path: String,
    pub views: u64,
}

/// Trait for analytics reporting backends.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Article page rows for the trailing `days` window, most viewed first.
    async fn page_views(&self, days: u32) -> Result<Vec<PageViewRow>>;

    /// Article page rows for roughly the last 30 minutes.
    async fn realtime_page_views(&self) -> Result<Vec<PageViewRow>>;

    /// View counts for every page on the site over `days`.
    async fn site_page_views(&self, days: u32) -> Result<Vec<PathViews>>;

    /// Human-readable name of this source.
    fn name(&self) -> &str;
}

/// Extract the article id from a page path such as `/articles/foo?ref=x`.
pub fn article_id_from_path(path: &str) -> Option<&str> {
    let start = path.find(ARTICLE_PATH_PREFIX)? + ARTICLE_PATH_PREFIX.len();
    let rest = &path[start..];
    let end = rest.find(['/', '?']).unwrap_or(rest.len());
    let id = &rest[..end];
    (!id.is_empty()).then_some(id)
}

pub struct AnalyticsService {
    source: Arc<dyn MetricsSource>,
    timeout: Duration,
    history_days: u32,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn MetricsSource>, timeout: Duration, history_days: u32) -> Self {
        Self {
            source,
            timeout,
            history_days,
        }
    }

    /// Historical rows, or empty when the source fails.
    pub async fn page_views_or_empty(&self, days: u32) -> Vec<PageViewRow> {
        match self.source.page_views(days).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(source = self.source.name(), days, error = %e, "Page view report failed");
                Vec::new()
            }
        }
    }

    /// Realtime rows, or empty when the source fails.
    pub async fn realtime_or_empty(&self) -> Vec<PageViewRow> {
        match self.source.realtime_page_views().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Realtime report failed");
                Vec::new()
            }
        }
    }

    /// Popularity metrics for the given articles, most popular first.
    ///
    /// The historical and realtime reports are fetched concurrently under one
    /// timeout; if either fails the whole computation fails.
    #[instrument(skip(self, article_ids), fields(articles = article_ids.len()))]
    pub async fn popularity_metrics(&self, article_ids: &[String]) -> Result<Vec<PopularityMetrics>> {
        let joint = async {
            tokio::try_join!(
                self.source.page_views(self.history_days),
                self.source.realtime_page_views(),
            )
        };

        let (historical, realtime) = tokio::time::timeout(self.timeout, joint)
            .await
            .map_err(|_| anyhow::anyhow!("Analytics reports timed out after {:?}", self.timeout))?
            .context("Analytics report failed")?;

        let metrics = scoring::popularity_metrics(&historical, &realtime, article_ids);

        info!(
            historical_rows = historical.len(),
            realtime_rows = realtime.len(),
            scored = metrics.len(),
            trending = metrics.iter().filter(|m| m.trending).count(),
            "Popularity metrics computed"
        );

        Ok(metrics)
    }

    /// Article ids whose last day of traffic is more than double their weekly daily average.
    pub async fn trending_articles(&self) -> Vec<String> {
        let (today, week) = tokio::join!(self.page_views_or_empty(1), self.page_views_or_empty(7));
        let rising = trend::rising_articles(&today, &week);
        info!(count = rising.len(), "Rising articles detected");
        rising
    }

    /// Fetch site-wide view counts and shape them into a snapshot.
    pub async fn views_snapshot(&self, now: DateTime<Utc>) -> Result<ViewsSnapshot> {
        let rows = self
            .source
            .site_page_views(self.history_days)
            .await
            .context("Site page view report failed")?;
        Ok(ViewsSnapshot::from_path_views(&rows, now))
    }
}
