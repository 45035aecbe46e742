use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analytics::snapshot::ViewsSnapshot;
use crate::api::AppState;
use crate::content::card::{article_url, image_alt, rank_badge_color, week_date_range, DateRange};
use crate::content::models::Article;
use crate::ranking::{ArticleWithMetrics, RankingSource};

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health.to_json().await)
}

pub(crate) async fn site_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.site.as_ref().clone())
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    page: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticlePage<'a> {
    page: usize,
    per_page: usize,
    total_pages: usize,
    total_articles: usize,
    articles: &'a [Article],
}

pub(crate) async fn articles_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let articles = state.store.articles();
    let Some(page) = params.page else {
        return Json(serde_json::to_value(articles).unwrap_or_default());
    };

    let per_page = state.site.posts_per_page.max(1);
    let body = ArticlePage {
        page,
        per_page,
        total_pages: articles.len().div_ceil(per_page),
        total_articles: articles.len(),
        articles: state.store.page(page, per_page),
    };
    Json(serde_json::to_value(&body).unwrap_or_default())
}

pub(crate) async fn authors_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::to_value(state.store.authors()).unwrap_or_default())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RankedCard {
    rank: usize,
    badge_color: &'static str,
    url: String,
    image_alt: String,
    #[serde(flatten)]
    entry: ArticleWithMetrics,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RankingResponse {
    source: RankingSource,
    period: DateRange,
    articles: Vec<RankedCard>,
}

pub(crate) async fn ranking_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    let (ranked, source) = state.ranking.ranked(now).await;
    state.health.record_ranking(source);

    let articles = ranked
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedCard {
            rank: i + 1,
            badge_color: rank_badge_color(i + 1),
            url: article_url(&entry.article.id),
            image_alt: image_alt(&entry.article).to_string(),
            entry,
        })
        .collect();

    Json(RankingResponse {
        source,
        period: week_date_range(now, 0),
        articles,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewedArticle<'a> {
    #[serde(flatten)]
    article: &'a Article,
    views: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewsRankingResponse<'a> {
    last_updated: Option<DateTime<Utc>>,
    articles: Vec<ViewedArticle<'a>>,
}

/// All-time ranking from the stored view snapshot. Without a snapshot every
/// article has zero views and the newest-first order is kept.
pub(crate) async fn views_ranking_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = match ViewsSnapshot::load(&state.views_snapshot) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(error = %e, "View snapshot unavailable");
            None
        }
    };

    let mut articles: Vec<&Article> = state.store.articles().iter().collect();
    if let Some(snapshot) = &snapshot {
        snapshot.sort_by_views(&mut articles, |a| a.id.as_str());
    }

    let body = ViewsRankingResponse {
        last_updated: snapshot.as_ref().map(|s| s.last_updated),
        articles: articles
            .into_iter()
            .map(|article| ViewedArticle {
                article,
                views: snapshot
                    .as_ref()
                    .map(|s| s.article_views(&article.id))
                    .unwrap_or(0),
            })
            .collect(),
    };
    Json(serde_json::to_value(&body).unwrap_or_default())
}

pub(crate) async fn trending_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ids = state.ranking.trending_articles().await;
    Json(serde_json::json!({ "articles": ids }))
}

pub(crate) async fn headlines_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (headlines, source) = state.ranking.headlines_with_source().await;
    state.health.record_ranking(source);
    Json(headlines)
}
