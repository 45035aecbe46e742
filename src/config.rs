use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub content: ContentConfig,
    pub analytics: AnalyticsConfig,
    pub wordpress: WordPressConfig,
    pub features: FeatureFlags,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    #[serde(default)]
    pub cors_allow_any_origin: bool,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub locale: String,
    pub posts_per_page: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub articles_dir: PathBuf,
    pub authors_dir: PathBuf,
    pub views_snapshot: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub history_days: u32,
}

impl AnalyticsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordPressConfig {
    pub enabled: bool,
    pub api_url: String,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Phase 1 reader features. Phase 2 features (comments, likes) are not built.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeatureFlags {
    pub auth: bool,
    pub bookmarks: bool,
    pub author_follow: bool,
    pub reading_history: bool,
    pub personalized_feed: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auth: true,
            bookmarks: true,
            author_follow: true,
            reading_history: true,
            personalized_feed: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub ga4_property_id: Option<String>,
    pub ga4_access_token: Option<SecretString>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<SecretString>,
    pub wordpress_username: Option<String>,
    pub wordpress_password: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            ga4_property_id: non_empty_var("GA4_PROPERTY_ID"),
            ga4_access_token: non_empty_var("GA4_ACCESS_TOKEN").map(SecretString::from),
            supabase_url: non_empty_var("SUPABASE_URL"),
            supabase_anon_key: non_empty_var("SUPABASE_ANON_KEY").map(SecretString::from),
            wordpress_username: non_empty_var("WORDPRESS_USERNAME"),
            wordpress_password: non_empty_var("WORDPRESS_PASSWORD").map(SecretString::from),
        }
    }

    /// Decide once whether the analytics-backed ranking path is attempted.
    pub fn analytics_setting(&self) -> AnalyticsSetting {
        match (&self.ga4_property_id, &self.ga4_access_token) {
            (Some(property_id), Some(token)) => AnalyticsSetting::Enabled(Ga4Credentials {
                property_id: property_id.clone(),
                access_token: copy_secret(token),
            }),
            _ => AnalyticsSetting::Disabled,
        }
    }

    pub fn supabase_credentials(&self) -> Option<(String, SecretString)> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => Some((url.clone(), copy_secret(key))),
            _ => None,
        }
    }

    pub fn wordpress_credentials(&self) -> Option<(String, SecretString)> {
        match (&self.wordpress_username, &self.wordpress_password) {
            (Some(user), Some(password)) => Some((user.clone(), copy_secret(password))),
            _ => None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

/// Whether GA4 is consulted for rankings.
pub enum AnalyticsSetting {
    Disabled,
    Enabled(Ga4Credentials),
}

pub struct Ga4Credentials {
    pub property_id: String,
    pub access_token: SecretString,
}

impl AppConfig {
    /// Load configuration from config/default.toml, overlaying environment variables for secrets.
    pub fn load() -> Result<(Self, Secrets)> {
        Self::load_from(Path::new("config/default.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }
}
