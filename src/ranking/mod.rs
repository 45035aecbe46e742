//! Article ranking for the top page and ranking page.
//!
//! Analytics-backed scores are used when GA4 is configured and answers in
//! time; any failure discards every analytics result for that request and
//! the whole list is ranked by the fallback heuristic instead.

pub mod fallback;
pub mod headlines;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::analytics::scoring::PopularityMetrics;
use crate::analytics::AnalyticsService;
use crate::content::models::Article;
use crate::content::ArticleStore;
use crate::ranking::fallback::{days_since_publish, fallback_score};
use crate::ranking::headlines::{select_main, select_subs, Headlines};

pub const TOP_ARTICLE_LIMIT: usize = 5;

/// An article with the numbers used to rank it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleWithMetrics {
    #[serde(flatten)]
    pub article: Article,
    pub popularity_score: f64,
    pub page_views: u64,
    pub trending: bool,
    /// True when the score came from analytics, false for the fallback heuristic.
    pub real_time_data: bool,
}

impl ArticleWithMetrics {
    fn from_fallback(article: &Article, index: usize, now: DateTime<Utc>) -> Self {
        let days = days_since_publish(article.data.published_time, now);
        Self {
            article: article.clone(),
            popularity_score: fallback_score(days, index),
            page_views: 0,
            trending: false,
            real_time_data: false,
        }
    }

    fn from_metrics(article: &Article, metrics: &PopularityMetrics) -> Self {
        Self {
            article: article.clone(),
            popularity_score: metrics.popularity_score,
            page_views: metrics.page_views,
            trending: metrics.trending,
            real_time_data: true,
        }
    }
}

/// Which policy produced a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingSource {
    Analytics,
    Fallback,
}

impl std::fmt::Display for RankingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analytics => write!(f, "analytics"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Rank with analytics metrics where available, fallback scores elsewhere.
///
/// Trending articles sort before all others; within each group by descending score.
pub fn rank_with_metrics(
    articles: &[Article],
    metrics: &[PopularityMetrics],
    now: DateTime<Utc>,
) -> Vec<ArticleWithMetrics> {
    let by_id: HashMap<&str, &PopularityMetrics> =
        metrics.iter().map(|m| (m.article_id.as_str(), m)).collect();

    let mut scored: Vec<ArticleWithMetrics> = articles
        .iter()
        .enumerate()
        .map(|(index, article)| match by_id.get(article.id.as_str()) {
            Some(m) => ArticleWithMetrics::from_metrics(article, m),
            None => ArticleWithMetrics::from_fallback(article, index, now),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.trending
            .cmp(&a.trending)
            .then_with(|| b.popularity_score.total_cmp(&a.popularity_score))
    });
    scored.truncate(TOP_ARTICLE_LIMIT);
    scored
}

/// Rank purely by the fallback heuristic.
pub fn rank_by_fallback(articles: &[Article], now: DateTime<Utc>) -> Vec<ArticleWithMetrics> {
    let mut scored: Vec<ArticleWithMetrics> = articles
        .iter()
        .enumerate()
        .map(|(index, article)| ArticleWithMetrics::from_fallback(article, index, now))
        .collect();

    scored.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
    scored.truncate(TOP_ARTICLE_LIMIT);
    scored
}

pub struct RankingHandler {
    store: Arc<ArticleStore>,
    analytics: Option<Arc<AnalyticsService>>,
}

impl RankingHandler {
    pub fn new(store: Arc<ArticleStore>, analytics: Option<Arc<AnalyticsService>>) -> Self {
        Self { store, analytics }
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn analytics_enabled(&self) -> bool {
        self.analytics.is_some()
    }

    /// Top articles and the policy that ranked them. Never fails.
    #[instrument(skip(self))]
    pub async fn ranked(&self, now: DateTime<Utc>) -> (Vec<ArticleWithMetrics>, RankingSource) {
        let articles = self.store.articles();

        if let Some(analytics) = &self.analytics {
            let ids = self.store.article_ids();
            match analytics.popularity_metrics(&ids).await {
                Ok(metrics) => {
                    let ranked = rank_with_metrics(articles, &metrics, now);
                    info!(
                        ranked = ranked.len(),
                        with_analytics = ranked.iter().filter(|a| a.real_time_data).count(),
                        "Articles ranked with analytics"
                    );
                    return (ranked, RankingSource::Analytics);
                }
                Err(e) => {
                    warn!(error = %e, "Analytics unavailable, falling back to default ranking");
                }
            }
        }

        (rank_by_fallback(articles, now), RankingSource::Fallback)
    }

    /// Up to five most popular articles.
    pub async fn top_articles(&self) -> Vec<ArticleWithMetrics> {
        self.ranked(Utc::now()).await.0
    }

    /// Fallback ranking without consulting analytics.
    pub fn top_articles_fallback(&self) -> Vec<ArticleWithMetrics> {
        rank_by_fallback(self.store.articles(), Utc::now())
    }

    /// Main and sub headlines from a single ranking pass.
    pub async fn headlines(&self) -> Headlines {
        self.headlines_with_source().await.0
    }

    /// Headlines plus the policy that ranked the pass behind them.
    pub async fn headlines_with_source(&self) -> (Headlines, RankingSource) {
        let (ranked, source) = self.ranked(Utc::now()).await;
        let articles = self.store.articles();
        let main = select_main(articles, &ranked);
        let subs = select_subs(articles, &ranked, main);
        let headlines = Headlines {
            main: main.cloned(),
            subs,
        };
        (headlines, source)
    }

    /// `None` only when there are no published articles.
    pub async fn main_headline(&self) -> Option<Article> {
        let articles = self.store.articles();
        if let Some(manual) = articles.iter().find(|a| a.data.is_main_headline) {
            return Some(manual.clone());
        }
        let ranked = self.top_articles().await;
        select_main(articles, &ranked).cloned()
    }

    pub async fn sub_headlines(&self) -> Vec<Article> {
        self.headlines().await.subs
    }

    /// Rising article ids; empty when analytics is disabled.
    pub async fn trending_articles(&self) -> Vec<String> {
        match &self.analytics {
            Some(analytics) => analytics.trending_articles().await,
            None => Vec::new(),
        }
    }
}
