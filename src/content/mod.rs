//! Static content collection: articles and authors loaded from markdown.
//!
//! The store is loaded once at startup and shared read-only. Drafts and
//! future-dated articles are excluded and the rest are ordered newest first.

pub mod card;
pub mod frontmatter;
pub mod models;
pub mod reading;

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ContentConfig;
use crate::content::models::{Article, ArticleData, Author};

pub struct ArticleStore {
    articles: Vec<Article>,
    authors: Vec<Author>,
}

impl ArticleStore {
    /// Load articles and authors from the configured directories.
    pub fn load(config: &ContentConfig, now: DateTime<Utc>) -> Result<Self> {
        let articles = load_entries::<ArticleData>(&config.articles_dir)?
            .into_iter()
            .map(|entry| {
                let last_modified = entry.data.modified_time.or(entry.modified);
                let text = reading::plain_text(&entry.body);
                Article {
                    minutes_read: reading::minutes_read_label(&text),
                    id: entry.id,
                    data: entry.data,
                    body: entry.body,
                    last_modified,
                }
            })
            .collect();

        let authors = load_entries::<Value>(&config.authors_dir)?
            .into_iter()
            .filter_map(|entry| {
                let mut fields = match entry.data {
                    Value::Object(map) => map,
                    _ => return None,
                };
                fields.insert("id".to_string(), Value::String(entry.id.clone()));
                match serde_json::from_value::<Author>(Value::Object(fields)) {
                    Ok(author) => Some(author),
                    Err(e) => {
                        warn!(author = %entry.id, error = %e, "Skipping malformed author entry");
                        None
                    }
                }
            })
            .collect();

        let store = Self::from_parts(articles, authors, now);
        info!(
            articles = store.articles.len(),
            authors = store.authors.len(),
            "Content collection loaded"
        );
        Ok(store)
    }

    /// Build a store from already-parsed entries, applying the publish filter and ordering.
    pub fn from_parts(articles: Vec<Article>, authors: Vec<Author>, now: DateTime<Utc>) -> Self {
        let mut articles: Vec<Article> = articles
            .into_iter()
            .filter(|a| !a.data.is_draft && a.data.published_time < now)
            .collect();
        // Stable: equal timestamps keep their load order
        articles.sort_by(|a, b| b.data.published_time.cmp(&a.data.published_time));

        Self { articles, authors }
    }

    /// All published articles, newest first.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn get(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn article_ids(&self) -> Vec<String> {
        self.articles.iter().map(|a| a.id.clone()).collect()
    }

    /// One page of the newest-first listing. Pages start at 1.
    pub fn page(&self, page: usize, per_page: usize) -> &[Article] {
        if page == 0 || per_page == 0 {
            return &[];
        }
        let start = (page - 1).saturating_mul(per_page);
        if start >= self.articles.len() {
            return &[];
        }
        let end = (start + per_page).min(self.articles.len());
        &self.articles[start..end]
    }

    /// Articles written by any of the given authors, newest first.
    pub fn by_authors(&self, author_ids: &[String]) -> Vec<&Article> {
        self.articles
            .iter()
            .filter(|a| a.data.authors.iter().any(|id| author_ids.contains(id)))
            .collect()
    }
}

struct RawEntry<T> {
    id: String,
    data: T,
    body: String,
    modified: Option<DateTime<Utc>>,
}

fn load_entries<T: DeserializeOwned>(dir: &Path) -> Result<Vec<RawEntry<T>>> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Content directory not found, collection is empty");
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read content directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("md") | Some("mdx")
            )
        })
        .collect();
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        match load_entry(&path) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {
                warn!(path = %path.display(), "Skipping content file without frontmatter");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed content file");
            }
        }
    }

    Ok(entries)
}

fn load_entry<T: DeserializeOwned>(path: &Path) -> Result<Option<RawEntry<T>>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let Some((fields, body)) = frontmatter::extract(&source)? else {
        return Ok(None);
    };

    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Content file name is not valid UTF-8")?
        .to_string();

    let data: T = serde_json::from_value(Value::Object(fields))
        .with_context(|| format!("Invalid frontmatter in {}", path.display()))?;

    let modified = git_last_commit_time(path).or_else(|| {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    });

    Ok(Some(RawEntry {
        id,
        data,
        body: body.to_string(),
        modified,
    }))
}

/// Committer date of the last commit touching `path`.
///
/// `None` when git is missing, the file is outside a repository or untracked.
fn git_last_commit_time(path: &Path) -> Option<DateTime<Utc>> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let output = Command::new("git")
        .args(["log", "-1", "--pretty=format:%cI", "--"])
        .arg(path.file_name()?)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stamp = String::from_utf8(output.stdout).ok()?;
    DateTime::parse_from_rfc3339(stamp.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).expect("write content file");
    }

    fn config(root: &Path) -> ContentConfig {
        ContentConfig {
            articles_dir: root.join("articles"),
            authors_dir: root.join("authors"),
            views_snapshot: root.join("views.json"),
        }
    }

    #[test]
    fn test_load_filters_drafts_and_future_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let articles = tmp.path().join("articles");
        std::fs::create_dir_all(&articles).unwrap();

        write(&articles, "older.md", "---\ntitle: Older\npublishedTime: 2025-01-01\nauthors: [tanaka]\n---\n古い記事\n");
        write(&articles, "newer.md", "---\ntitle: Newer\npublishedTime: 2025-02-01\n---\n新しい記事\n");
        write(&articles, "draft.md", "---\ntitle: Draft\npublishedTime: 2025-01-15\nisDraft: true\n---\n");
        write(&articles, "future.md", "---\ntitle: Future\npublishedTime: 2099-01-01\n---\n");
        write(&articles, "broken.md", "---\ndescription: no title or date\n---\n");
        write(&articles, "notes.txt", "ignored");

        let now = Utc::now();
        let store = ArticleStore::load(&config(tmp.path()), now).unwrap();

        let ids: Vec<&str> = store.articles().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
        assert_eq!(store.articles()[1].minutes_read, "1分で読めます");
        assert!(store.articles()[0].last_modified.is_some());
        assert_eq!(store.by_authors(&["tanaka".to_string()]).len(), 1);
        assert!(store.authors().is_empty());
    }

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(["-c", "user.name=BizMap", "-c", "user.email=dev@example.com", "-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .env("GIT_COMMITTER_DATE", "2025-03-04T05:06:07+09:00")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_last_modified_prefers_git_commit_date() {
        let tmp = tempfile::tempdir().unwrap();
        let articles = tmp.path().join("articles");
        std::fs::create_dir_all(&articles).unwrap();
        write(&articles, "tracked.md", "---\ntitle: Tracked\npublishedTime: 2025-01-01\n---\n本文\n");
        write(&articles, "untracked.md", "---\ntitle: Untracked\npublishedTime: 2025-01-02\n---\n本文\n");

        if !git(tmp.path(), &["init", "-q"]) {
            // git is not installed
            return;
        }
        assert!(git(tmp.path(), &["add", "articles/tracked.md"]));
        assert!(git(tmp.path(), &["commit", "-q", "-m", "add article"]));

        let store = ArticleStore::load(&config(tmp.path()), Utc::now()).unwrap();

        let tracked = store.get("tracked").expect("tracked article");
        let committed = DateTime::parse_from_rfc3339("2025-03-04T05:06:07+09:00").unwrap();
        assert_eq!(tracked.last_modified, Some(committed.with_timezone(&Utc)));

        // Untracked files fall back to the file's mtime
        let untracked = store.get("untracked").expect("untracked article");
        let mtime = untracked.last_modified.expect("mtime fallback");
        assert!(mtime > committed.with_timezone(&Utc));
    }

    #[test]
    fn test_git_commit_time_outside_repository_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "loose.md", "---\ntitle: Loose\n---\n");
        assert!(git_last_commit_time(&tmp.path().join("loose.md")).is_none());
    }

    #[test]
    fn test_load_authors() {
        let tmp = tempfile::tempdir().unwrap();
        let authors = tmp.path().join("authors");
        std::fs::create_dir_all(&authors).unwrap();
        write(&authors, "tanaka.md", "---\nname: 田中 太郎\njob: 代表\n---\n");

        let store = ArticleStore::load(&config(tmp.path()), Utc::now()).unwrap();
        assert_eq!(store.authors().len(), 1);
        assert_eq!(store.authors()[0].id, "tanaka");
        assert_eq!(store.authors()[0].job.as_deref(), Some("代表"));
    }

    #[test]
    fn test_page_bounds() {
        let now = Utc::now();
        let articles = (0..5)
            .map(|i| Article {
                id: format!("a{i}"),
                data: ArticleData {
                    title: format!("A{i}"),
                    description: String::new(),
                    cover: None,
                    cover_alt: None,
                    covert_alt: None,
                    published_time: now - Duration::days(i),
                    modified_time: None,
                    is_draft: false,
                    is_main_headline: false,
                    is_sub_headline: false,
                    authors: vec![],
                    category: None,
                    tags: vec![],
                },
                body: String::new(),
                minutes_read: String::new(),
                last_modified: None,
            })
            .collect();
        // i = 0 is published exactly at `now` and is excluded
        let store = ArticleStore::from_parts(articles, vec![], now);
        assert_eq!(store.articles().len(), 4);
        assert_eq!(store.page(1, 3).len(), 3);
        assert_eq!(store.page(2, 3).len(), 1);
        assert!(store.page(3, 3).is_empty());
        assert!(store.page(0, 3).is_empty());
        assert_eq!(store.get("a1").map(|a| a.data.title.as_str()), Some("A1"));
    }
}
