use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Publish,
    Future,
    Draft,
    Pending,
    Private,
}

/// Custom meta fields registered on the WordPress side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub industry_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub region_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub date_gmt: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub author: u64,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub meta: PostMeta,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    #[serde(default, rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Embedded {
    #[serde(default)]
    pub author: Vec<WpAuthor>,
    #[serde(default, rename = "wp:featuredmedia")]
    pub featured_media: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WpAuthor {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub avatar_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: u64,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub media_details: MediaDetails,
    #[serde(default)]
    pub source_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaDetails {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub sizes: BTreeMap<String, MediaSize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSize {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub mime_type: String,
    pub source_url: String,
}

/// Japanese facets derived from the post meta.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JapaneseMeta {
    pub industry: String,
    pub technology: String,
    pub region: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocalizedPost {
    #[serde(flatten)]
    pub post: Post,
    pub japanese_meta: JapaneseMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub categories: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
    /// Defaults to draft when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PostMeta>,
}

/// Partial update; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PostMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_deserializes_with_embedded() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "id": 7,
            "status": "publish",
            "title": {"rendered": "宮崎のDX"},
            "content": {"rendered": "<p>本文</p>", "protected": false},
            "meta": {"industry_tags": ["建設業"], "subcategory": "dx-cloud"},
            "categories": [3],
            "_embedded": {
                "author": [{"id": 1, "name": "Sato", "avatar_urls": {"96": "https://x/96.png"}}],
                "wp:featuredmedia": [{"id": 9, "source_url": "https://x/full.jpg"}]
            }
        }))
        .expect("valid post JSON");

        assert_eq!(post.title.rendered, "宮崎のDX");
        assert_eq!(post.meta.industry_tags, vec!["建設業"]);
        let embedded = post.embedded.expect("embedded");
        assert_eq!(embedded.author[0].name, "Sato");
        assert_eq!(embedded.featured_media[0].source_url, "https://x/full.jpg");
    }

    #[test]
    fn test_create_request_skips_unset_fields() {
        let request = CreatePostRequest {
            title: "t".to_string(),
            content: "c".to_string(),
            excerpt: None,
            categories: vec![1],
            tags: vec![],
            featured_media: None,
            status: Some(PostStatus::Draft),
            meta: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["status"], "draft");
        assert!(json.get("excerpt").is_none());
        assert!(json.get("tags").is_none());
    }
}
