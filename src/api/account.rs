use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::accounts::history::DEFAULT_HISTORY_LIMIT;
use crate::accounts::models::OAuthProvider;
use crate::accounts::{AccountError, SupabaseClient};
use crate::api::{bearer_token, ApiError, AppState};
use crate::content::models::Article;

type ApiResult<T> = Result<T, ApiError>;

fn accounts(state: &AppState) -> ApiResult<Arc<SupabaseClient>> {
    state
        .accounts
        .clone()
        .ok_or_else(|| ApiError::NotFound("Accounts are not configured".to_string()))
}

// -- Session --

pub(crate) async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers).ok_or(AccountError::AuthRequired)?;
    let profile = client
        .current_profile(Some(token.as_str()))
        .await
        .ok_or(AccountError::AuthRequired)?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub(crate) struct OAuthParams {
    origin: Option<String>,
}

pub(crate) async fn oauth_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthParams>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let provider: OAuthProvider = provider.parse().map_err(ApiError::BadRequest)?;
    let origin = params.origin.unwrap_or_else(|| state.site.url.clone());

    Ok(Json(serde_json::json!({
        "provider": provider.as_str(),
        "displayName": provider.display_name(),
        "url": client.oauth_authorize_url(provider, &origin),
    })))
}

pub(crate) async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers).ok_or(AccountError::AuthRequired)?;
    client.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Bookmarks --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookmarkBody {
    article_id: String,
}

pub(crate) async fn bookmarks_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    Ok(Json(client.bookmarks(token.as_deref()).await?))
}

pub(crate) async fn add_bookmark_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BookmarkBody>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    if state.store.get(&body.article_id).is_none() {
        return Err(ApiError::NotFound(format!("Unknown article: {}", body.article_id)));
    }
    let token = bearer_token(&headers);
    let bookmark = client.add_bookmark(token.as_deref(), &body.article_id).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

pub(crate) async fn is_bookmarked_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    let bookmarked = client.is_bookmarked(token.as_deref(), &article_id).await;
    Ok(Json(serde_json::json!({ "articleId": article_id, "bookmarked": bookmarked })))
}

pub(crate) async fn remove_bookmark_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    client.remove_bookmark(token.as_deref(), &article_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Author follows --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FollowBody {
    author_id: String,
}

pub(crate) async fn follows_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    Ok(Json(client.followed_authors(token.as_deref()).await?))
}

pub(crate) async fn follow_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FollowBody>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    if !state.store.authors().iter().any(|a| a.id == body.author_id) {
        return Err(ApiError::NotFound(format!("Unknown author: {}", body.author_id)));
    }
    let token = bearer_token(&headers);
    let follow = client.follow_author(token.as_deref(), &body.author_id).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

pub(crate) async fn is_following_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(author_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    let following = client.is_following(token.as_deref(), &author_id).await;
    Ok(Json(serde_json::json!({ "authorId": author_id, "following": following })))
}

pub(crate) async fn unfollow_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(author_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    client.unfollow_author(token.as_deref(), &author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Reading history and feed --

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryParams {
    limit: Option<usize>,
}

pub(crate) async fn history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(client.reading_history(token.as_deref(), limit).await))
}

pub(crate) async fn track_view_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    client
        .track_article_view(token.as_deref(), &article_id, Utc::now())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Articles by the authors the reader follows, newest first.
pub(crate) async fn feed_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let client = accounts(&state)?;
    let token = bearer_token(&headers);
    let author_ids: Vec<String> = client
        .followed_authors(token.as_deref())
        .await?
        .into_iter()
        .map(|f| f.author_id)
        .collect();

    let articles: Vec<Article> = state
        .store
        .by_authors(&author_ids)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(articles))
}
