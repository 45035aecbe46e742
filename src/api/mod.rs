//! JSON HTTP API consumed by the site frontend.

mod account;
mod content;
mod wordpress;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::accounts::{AccountError, SupabaseClient};
use crate::config::{FeatureFlags, ServerConfig, SiteConfig};
use crate::content::ArticleStore;
use crate::monitoring::health::HealthState;
use crate::ranking::RankingHandler;
use crate::wordpress::WordPressClient;

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<SiteConfig>,
    pub features: FeatureFlags,
    pub store: Arc<ArticleStore>,
    pub ranking: Arc<RankingHandler>,
    pub health: HealthState,
    pub views_snapshot: Arc<PathBuf>,
    pub accounts: Option<Arc<SupabaseClient>>,
    pub wordpress: Option<Arc<WordPressClient>>,
}

pub fn router(state: AppState, cors_allow_any_origin: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(content::health_handler))
        .route("/api/site.json", get(content::site_handler))
        .route("/api/articles.json", get(content::articles_handler))
        .route("/api/authors.json", get(content::authors_handler))
        .route("/api/ranking", get(content::ranking_handler))
        .route("/api/ranking/views", get(content::views_ranking_handler))
        .route("/api/trending", get(content::trending_handler))
        .route("/api/headlines", get(content::headlines_handler));

    if state.accounts.is_some() {
        app = app.merge(account_routes(state.features));
    }

    if state.wordpress.is_some() {
        app = app
            .route("/api/wordpress/latest", get(wordpress::latest_handler))
            .route("/api/wordpress/ranking", get(wordpress::ranking_handler));
    }

    let cors = if cors_allow_any_origin {
        CorsLayer::permissive()
    } else {
        match state.site.url.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new().allow_origin(origin),
            Err(e) => {
                warn!(error = %e, url = %state.site.url, "Site URL is not a valid origin, CORS disabled");
                CorsLayer::new()
            }
        }
    };

    app.layer(cors).with_state(state)
}

fn account_routes(features: FeatureFlags) -> Router<AppState> {
    let mut routes = Router::new();

    if features.auth {
        routes = routes
            .route("/api/me", get(account::me_handler))
            .route("/api/auth/{provider}", get(account::oauth_handler))
            .route("/api/auth/logout", post(account::logout_handler));
    }
    if features.bookmarks {
        routes = routes
            .route(
                "/api/bookmarks",
                get(account::bookmarks_handler).post(account::add_bookmark_handler),
            )
            .route(
                "/api/bookmarks/{article_id}",
                get(account::is_bookmarked_handler).delete(account::remove_bookmark_handler),
            );
    }
    if features.author_follow {
        routes = routes
            .route(
                "/api/follows",
                get(account::follows_handler).post(account::follow_handler),
            )
            .route(
                "/api/follows/{author_id}",
                get(account::is_following_handler).delete(account::unfollow_handler),
            );
    }
    if features.reading_history {
        routes = routes
            .route("/api/history", get(account::history_handler))
            .route("/api/history/{article_id}", post(account::track_view_handler));
    }
    if features.personalized_feed {
        routes = routes.route("/api/feed", get(account::feed_handler));
    }

    routes
}

/// Serve the API until the process is stopped.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let app = router(state, config.cors_allow_any_origin);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "API server listening");

    axum::serve(listener, app).await.context("API server error")
}

/// Bearer token from the `Authorization` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[derive(Debug)]
pub(crate) enum ApiError {
    NotFound(String),
    BadRequest(String),
    Account(AccountError),
    Upstream(anyhow::Error),
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        Self::Account(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Upstream(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::Account(e) => {
                let status = match &e {
                    AccountError::AuthRequired => StatusCode::UNAUTHORIZED,
                    AccountError::AlreadyBookmarked | AccountError::AlreadyFollowing => {
                        StatusCode::CONFLICT
                    }
                    AccountError::Api { .. } | AccountError::Http(_) | AccountError::Decode(_) => {
                        warn!(error = %e, "Supabase call failed");
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, e.to_string())
            }
            Self::Upstream(e) => {
                warn!(error = %e, "Upstream call failed");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_account_errors_map_to_status() {
        let status = |e: AccountError| ApiError::from(e).into_response().status();
        assert_eq!(status(AccountError::AuthRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AccountError::AlreadyBookmarked), StatusCode::CONFLICT);
        assert_eq!(
            status(AccountError::Api {
                status: 500,
                code: None,
                message: "boom".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
