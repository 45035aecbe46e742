//! Periodic view-count snapshot written by `bizmap update-views`.
//!
//! The JSON layout (`lastUpdated`, `views`, `totalViews`) is read back by the
//! server for the all-time ranking.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{PathViews, ARTICLE_PATH_PREFIX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsSnapshot {
    pub last_updated: DateTime<Utc>,
    /// Views keyed by article id.
    pub views: BTreeMap<String, u64>,
    /// Views keyed by raw page path, for every page.
    pub total_views: BTreeMap<String, u64>,
}

impl ViewsSnapshot {
    /// Only paths of the exact form `/articles/{id}` count toward an article.
    pub fn from_path_views(rows: &[PathViews], now: DateTime<Utc>) -> Self {
        let total_views: BTreeMap<String, u64> =
            rows.iter().map(|r| (r.path.clone(), r.views)).collect();

        let views = total_views
            .iter()
            .filter_map(|(path, views)| {
                let id = path.strip_prefix(ARTICLE_PATH_PREFIX)?;
                (!id.is_empty() && !id.contains('/')).then(|| (id.to_string(), *views))
            })
            .collect();

        Self {
            last_updated: now,
            views,
            total_views,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Write pretty-printed JSON, creating the parent directory.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Views for one article, zero when it has none recorded.
    pub fn article_views(&self, article_id: &str) -> u64 {
        self.views.get(article_id).copied().unwrap_or(0)
    }

    /// Stable sort by descending view count.
    pub fn sort_by_views<T>(&self, items: &mut [T], id: impl Fn(&T) -> &str) {
        items.sort_by(|a, b| self.article_views(id(b)).cmp(&self.article_views(id(a))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<PathViews> {
        vec![
            PathViews { path: "/articles/a".to_string(), views: 40 },
            PathViews { path: "/articles/b".to_string(), views: 90 },
            PathViews { path: "/articles/b/amp".to_string(), views: 5 },
            PathViews { path: "/".to_string(), views: 1_000 },
        ]
    }

    #[test]
    fn test_from_path_views_exact_article_paths() {
        let snapshot = ViewsSnapshot::from_path_views(&rows(), Utc::now());
        assert_eq!(snapshot.views.len(), 2);
        assert_eq!(snapshot.article_views("b"), 90);
        assert_eq!(snapshot.article_views("missing"), 0);
        assert_eq!(snapshot.total_views.len(), 4);
    }

    #[test]
    fn test_sort_by_views() {
        let snapshot = ViewsSnapshot::from_path_views(&rows(), Utc::now());
        let mut ids = vec!["c", "a", "b"];
        snapshot.sort_by_views(&mut ids, |id| *id);
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_write_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data").join("article-views.json");
        let snapshot = ViewsSnapshot::from_path_views(&rows(), Utc::now());

        snapshot.write_to(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"lastUpdated\""));
        assert!(raw.contains("\"totalViews\""));

        let loaded = ViewsSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }
}
