//! Presentation helpers for WordPress posts: plain text, excerpts, slugs and
//! Japanese date labels.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::content::models::parse_datetime;
use crate::content::reading::is_japanese_char;
use crate::wordpress::client::{PostQuery, WordPressClient};
use crate::wordpress::models::{Category, JapaneseMeta, LocalizedPost, Post};

const JAPANESE_CHARS_PER_MINUTE: f64 = 500.0;
const ENGLISH_WORDS_PER_MINUTE: f64 = 250.0;

pub const DEFAULT_EXCERPT_LENGTH: usize = 120;
pub const DEFAULT_IMAGE_SIZE: &str = "medium_large";

/// Category slugs and their display names in the site navigation.
pub const CATEGORY_NAMES: &[(&str, &str)] = &[
    ("business-ideas", "飲食店"),
    ("management-it", "小売・小店舗"),
    ("local-tech", "サービス業"),
    ("freelance", "IT・ウェブ"),
    ("new-workstyle", "製造・工業"),
    ("small-business", "医療・介護"),
    ("dx", "教育・スクール"),
    ("ai-business", "建設・不動産"),
];

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("static pattern"))
}

fn slug_disallowed() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("static pattern"))
}

fn whitespace_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

fn hyphen_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-+").expect("static pattern"))
}

pub fn strip_html(html: &str) -> String {
    tag_pattern().replace_all(html, "").trim().to_string()
}

/// Minutes to read rendered HTML: 500 Japanese characters or 250 English
/// words per minute, at least one.
pub fn calculate_reading_time(content: &str) -> u32 {
    let plain = strip_html(content);
    let japanese = plain.chars().filter(|c| is_japanese_char(*c)).count();
    let rest: String = plain.chars().filter(|c| !is_japanese_char(*c)).collect();
    let english = rest.split_whitespace().count();

    let minutes = (japanese as f64 / JAPANESE_CHARS_PER_MINUTE
        + english as f64 / ENGLISH_WORDS_PER_MINUTE)
        .ceil() as u32;
    minutes.max(1)
}

/// Attach the reading time and Japanese facets to a post.
pub fn localize_post(mut post: Post) -> LocalizedPost {
    post.meta.reading_time = Some(calculate_reading_time(&post.content.rendered));

    let first_or = |tags: &[String], default: &str| {
        tags.first()
            .filter(|t| !t.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    let subcategory = post.meta.subcategory.clone();
    let category = subcategory
        .as_deref()
        .and_then(|s| s.split('-').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("dx")
        .to_string();

    let japanese_meta = JapaneseMeta {
        industry: first_or(&post.meta.industry_tags, "製造業"),
        technology: first_or(&post.meta.tech_tags, "クラウド"),
        region: first_or(&post.meta.region_tags, "宮崎市"),
        category,
        subcategory,
    };

    LocalizedPost { post, japanese_meta }
}

pub fn category_slug(category_id: u64, categories: &[Category]) -> String {
    categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.slug.clone())
        .unwrap_or_else(|| "other".to_string())
}

/// Display name for a category slug; unknown slugs are returned as is.
pub fn japanese_category_name(slug: &str) -> &str {
    CATEGORY_NAMES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, name)| *name)
        .unwrap_or(slug)
}

/// Plain-text excerpt of at most `max_len` characters plus an ellipsis.
///
/// Text ending in Japanese is cut at the character limit; English text is
/// cut at the last space when that space is in the final fifth.
pub fn generate_excerpt(content: &str, max_len: usize) -> String {
    let plain = strip_html(content);
    if plain.chars().count() <= max_len {
        return plain;
    }

    let truncated: Vec<char> = plain.chars().take(max_len).collect();
    let ends_in_japanese = truncated
        .iter()
        .rev()
        .take_while(|c| c.is_whitespace() || is_japanese_char(**c))
        .any(|c| is_japanese_char(*c));

    if !ends_in_japanese {
        if let Some(last_space) = truncated.iter().rposition(|c| *c == ' ') {
            if last_space as f64 > max_len as f64 * 0.8 {
                let head: String = truncated[..last_space].iter().collect();
                return format!("{head}...");
            }
        }
    }

    let head: String = truncated.into_iter().collect();
    format!("{head}...")
}

/// ASCII slug from a title. Japanese characters are dropped.
pub fn generate_slug(title: &str) -> String {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !is_japanese_char(*c))
        .collect();
    let cleaned = slug_disallowed().replace_all(&lowered, "");
    let hyphenated = whitespace_run().replace_all(cleaned.trim(), "-");
    let collapsed = hyphen_run().replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Featured image in the requested size, falling back to the original upload.
pub fn featured_image_url(post: &Post, size: &str) -> Option<String> {
    let media = post.embedded.as_ref()?.featured_media.first()?;
    let url = media
        .media_details
        .sizes
        .get(size)
        .map(|s| s.source_url.clone())
        .unwrap_or_else(|| media.source_url.clone());
    Some(url)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

pub fn author_info(post: &Post) -> Option<AuthorInfo> {
    let author = post.embedded.as_ref()?.author.first()?;
    let avatar = author
        .avatar_urls
        .get("96")
        .or_else(|| author.avatar_urls.get("48"))
        .cloned();
    Some(AuthorInfo {
        name: author.name.clone(),
        avatar,
    })
}

/// Newest posts sharing the post's categories, excluding the post itself.
/// Errors are logged and yield an empty list.
pub async fn related_posts(client: &WordPressClient, post: &Post, limit: u32) -> Vec<Post> {
    let query = PostQuery {
        categories: post.categories.clone(),
        ..PostQuery::latest(limit + 1)
    };

    match client.get_posts(&query).await {
        Ok(posts) => posts
            .into_iter()
            .filter(|p| p.id != post.id)
            .take(limit as usize)
            .collect(),
        Err(e) => {
            warn!(error = %e, post_id = post.id, "Failed to fetch related posts");
            Vec::new()
        }
    }
}

fn japan_time() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("JST offset in range")
}

/// "2025年3月5日" in Japan time. Unparsable input is returned unchanged.
pub fn format_publish_date(date: &str) -> String {
    match parse_datetime(date) {
        Some(dt) => format_japanese_date(dt),
        None => date.to_string(),
    }
}

fn format_japanese_date(dt: DateTime<Utc>) -> String {
    let local = dt.with_timezone(&japan_time());
    format!("{}年{}月{}日", local.year(), local.month(), local.day())
}

/// Relative label for recent updates, the publish-date format otherwise.
pub fn format_modified_date(date: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_datetime(date) else {
        return date.to_string();
    };

    match (now - dt).num_days() {
        0 => "今日更新".to_string(),
        1 => "昨日更新".to_string(),
        d @ 2..=6 => format!("{d}日前更新"),
        _ => format_japanese_date(dt),
    }
}
