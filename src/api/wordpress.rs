use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::api::{ApiError, AppState};
use crate::wordpress::helpers::localize_post;
use crate::wordpress::models::LocalizedPost;
use crate::wordpress::RankingPeriod;

const DEFAULT_LATEST_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub(crate) struct LatestParams {
    limit: Option<u32>,
}

pub(crate) async fn latest_handler(
    State(state): State<AppState>,
    Query(params): Query<LatestParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state
        .wordpress
        .clone()
        .ok_or_else(|| ApiError::NotFound("WordPress is not configured".to_string()))?;

    let posts = client
        .latest_posts(params.limit.unwrap_or(DEFAULT_LATEST_LIMIT))
        .await?;
    let localized: Vec<LocalizedPost> = posts.into_iter().map(localize_post).collect();
    Ok(Json(localized))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankingParams {
    period: Option<RankingPeriod>,
}

pub(crate) async fn ranking_handler(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state
        .wordpress
        .clone()
        .ok_or_else(|| ApiError::NotFound("WordPress is not configured".to_string()))?;

    let posts = client
        .get_ranking_data(params.period.unwrap_or(RankingPeriod::Week))
        .await?;
    let localized: Vec<LocalizedPost> = posts.into_iter().map(localize_post).collect();
    Ok(Json(localized))
}
