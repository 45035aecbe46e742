use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub article_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorFollow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub article_id: String,
    pub last_read_at: DateTime<Utc>,
}

/// GoTrue user behind an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupabaseUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
        }
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(format!("Unsupported OAuth provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_row_timestamps() {
        let bookmark: Bookmark = serde_json::from_value(serde_json::json!({
            "id": "6f1c1f2e-5a4b-4c3d-9e8f-0a1b2c3d4e5f",
            "user_id": "0b7e8f6a-1c2d-4e3f-8a9b-c0d1e2f3a4b5",
            "article_id": "miyazaki-dx",
            "created_at": "2025-03-01T09:30:00.123456+00:00"
        }))
        .expect("valid bookmark row");
        assert_eq!(bookmark.article_id, "miyazaki-dx");
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("GitHub".parse::<OAuthProvider>(), Ok(OAuthProvider::Github));
        assert!("twitter".parse::<OAuthProvider>().is_err());
    }
}
