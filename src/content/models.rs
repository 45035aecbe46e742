use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A published article from the content collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// File stem, also the URL slug under `/articles/`.
    pub id: String,
    pub data: ArticleData,
    #[serde(default)]
    pub body: String,
    /// Display text such as "3分で読めます".
    #[serde(default)]
    pub minutes_read: String,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Frontmatter fields of an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, rename = "cover_alt")]
    pub cover_alt: Option<String>,
    /// Misspelled key still present in older entries.
    #[serde(default, rename = "covert_alt")]
    pub covert_alt: Option<String>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub published_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_flexible_datetime")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub is_main_headline: bool,
    #[serde(default)]
    pub is_sub_headline: bool,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Author profile from the content collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub social: BTreeMap<String, String>,
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare date (UTC midnight).
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {raw}")))
}

fn optional_flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap();
        assert_eq!(parse_datetime("2025-03-01T10:00:00+09:00"), Some(expected));
        assert_eq!(parse_datetime("2025-03-01T01:00:00"), Some(expected));
        assert_eq!(
            parse_datetime("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn test_article_data_from_json() {
        let data: ArticleData = serde_json::from_value(serde_json::json!({
            "title": "宮崎で起業した理由",
            "publishedTime": "2025-03-01",
            "isMainHeadline": true,
            "covert_alt": "店舗の外観",
        }))
        .expect("valid frontmatter");

        assert_eq!(data.title, "宮崎で起業した理由");
        assert!(data.is_main_headline);
        assert!(!data.is_draft);
        assert_eq!(data.covert_alt.as_deref(), Some("店舗の外観"));
        assert!(data.modified_time.is_none());
    }
}
