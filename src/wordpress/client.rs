//! WordPress REST API client (`/wp-json/wp/v2`).
//!
//! Requests are rate limited and carry basic auth when credentials are set.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::WordPressConfig;
use crate::wordpress::models::{
    Category, CreatePostRequest, Media, Post, PostStatus, PostUpdate, WpAuthor,
};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrderBy {
    Date,
    Modified,
    Title,
    MenuOrder,
    Relevance,
}

impl PostOrderBy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Modified => "modified",
            Self::Title => "title",
            Self::MenuOrder => "menu_order",
            Self::Relevance => "relevance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters for `GET /posts`.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub categories: Vec<u64>,
    pub search: Option<String>,
    pub orderby: Option<PostOrderBy>,
    pub order: Option<SortOrder>,
}

impl PostQuery {
    /// Newest posts first.
    pub fn latest(limit: u32) -> Self {
        Self {
            per_page: Some(limit),
            orderby: Some(PostOrderBy::Date),
            order: Some(SortOrder::Desc),
            ..Self::default()
        }
    }

    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if !self.categories.is_empty() {
            let ids: Vec<String> = self.categories.iter().map(u64::to_string).collect();
            pairs.push(("categories", ids.join(",")));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(orderby) = self.orderby {
            pairs.push(("orderby", orderby.as_str().to_string()));
        }
        if let Some(order) = self.order {
            let order = match order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            pairs.push(("order", order.to_string()));
        }
        pairs
    }
}

/// Window for the custom ranking endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingPeriod {
    Week,
    Month,
}

impl RankingPeriod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

pub struct WordPressClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, SecretString)>,
    limiter: Arc<Limiter>,
}

impl WordPressClient {
    pub fn new(config: &WordPressConfig, credentials: Option<(String, SecretString)>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create WordPress HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            limiter: create_rate_limiter(config.requests_per_second, config.burst_size),
        })
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.limiter.until_ready().await;

        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password.expose_secret())),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to fetch {what}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to fetch {what}: {status}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {what}"))
    }

    #[instrument(skip(self))]
    pub async fn get_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let builder = self.request(Method::GET, "/posts").await.query(&query.to_pairs());
        let posts: Vec<Post> = self.send(builder, "posts").await?;
        info!(count = posts.len(), "WordPress posts fetched");
        Ok(posts)
    }

    pub async fn get_post(&self, id: u64) -> Result<Post> {
        let builder = self.request(Method::GET, &format!("/posts/{id}")).await;
        self.send(builder, "post").await
    }

    pub async fn get_posts_by_category(&self, category_slug: &str, limit: u32) -> Result<Vec<Post>> {
        let categories = self.get_categories().await?;
        let category = categories
            .iter()
            .find(|c| c.slug == category_slug)
            .ok_or_else(|| anyhow!("Category not found: {category_slug}"))?;

        self.get_posts(&PostQuery {
            categories: vec![category.id],
            ..PostQuery::latest(limit)
        })
        .await
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let builder = self.request(Method::GET, "/categories").await;
        self.send(builder, "categories").await
    }

    pub async fn get_authors(&self) -> Result<Vec<WpAuthor>> {
        let builder = self.request(Method::GET, "/users").await;
        self.send(builder, "authors").await
    }

    pub async fn get_media(&self, id: u64) -> Result<Media> {
        let builder = self.request(Method::GET, &format!("/media/{id}")).await;
        self.send(builder, "media").await
    }

    /// Create a post, as a draft unless a status is given.
    pub async fn create_post(&self, post: &CreatePostRequest) -> Result<Post> {
        let mut body = post.clone();
        body.status.get_or_insert(PostStatus::Draft);

        let builder = self.request(Method::POST, "/posts").await.json(&body);
        let created: Post = self.send(builder, "created post").await?;
        info!(id = created.id, "WordPress post created");
        Ok(created)
    }

    pub async fn update_post(&self, id: u64, updates: &PostUpdate) -> Result<Post> {
        self.post_json(&format!("/posts/{id}"), updates, "updated post").await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.send(builder, what).await
    }

    /// Posts from the custom ranking endpoint, or the ten latest posts when
    /// the endpoint is unavailable.
    #[instrument(skip(self))]
    pub async fn get_ranking_data(&self, period: RankingPeriod) -> Result<Vec<Post>> {
        let builder = self
            .request(Method::GET, &format!("/ranking/{}", period.as_str()))
            .await;

        let response = builder
            .send()
            .await
            .context("Failed to fetch ranking data")?;

        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                period = period.as_str(),
                "Ranking endpoint unavailable, using latest posts"
            );
            return self.get_posts(&PostQuery::latest(10)).await;
        }

        response
            .json::<Vec<Post>>()
            .await
            .context("Failed to parse ranking data")
    }

    pub async fn search_posts(&self, query: &str, limit: u32) -> Result<Vec<Post>> {
        self.get_posts(&PostQuery {
            search: Some(query.to_string()),
            per_page: Some(limit),
            orderby: Some(PostOrderBy::Relevance),
            ..PostQuery::default()
        })
        .await
    }

    pub async fn latest_posts(&self, limit: u32) -> Result<Vec<Post>> {
        self.get_posts(&PostQuery::latest(limit)).await
    }

    pub async fn category_posts(&self, category_slug: &str, limit: u32) -> Result<Vec<Post>> {
        self.get_posts_by_category(category_slug, limit).await
    }

    /// Latest three posts; featured posts are not marked separately yet.
    pub async fn featured_posts(&self) -> Result<Vec<Post>> {
        self.get_posts(&PostQuery::latest(3)).await
    }
}

fn create_rate_limiter(requests_per_second: u32, burst_size: u32) -> Arc<Limiter> {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst_size).unwrap_or(rps);

    let quota = Quota::per_second(rps).allow_burst(burst);
    Arc::new(RateLimiter::direct(quota))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let query = PostQuery {
            categories: vec![3, 5],
            ..PostQuery::latest(6)
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("per_page", "6".to_string())));
        assert!(pairs.contains(&("categories", "3,5".to_string())));
        assert!(pairs.contains(&("orderby", "date".to_string())));
        assert!(pairs.contains(&("order", "desc".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "page"));
    }

    #[test]
    fn test_empty_query_has_no_pairs() {
        assert!(PostQuery::default().to_pairs().is_empty());
    }
}
