use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::accounts::client::{eq, SupabaseClient};
use crate::accounts::models::ReadingHistory;

const READING_HISTORY: &str = "reading_history";
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

impl SupabaseClient {
    /// Record that the reader opened an article. Anonymous readers are not
    /// tracked; failures are logged and swallowed.
    pub async fn track_article_view(&self, token: Option<&str>, article_id: &str, now: DateTime<Utc>) {
        let (Some(user), Some(token)) = (self.optional_user(token).await, token) else {
            debug!(article_id, "Anonymous view not recorded");
            return;
        };

        let row = json!({
            "user_id": user.id,
            "article_id": article_id,
            "last_read_at": now.to_rfc3339(),
        });

        let result = self
            .insert::<_, serde_json::Value>(
                READING_HISTORY,
                token,
                &row,
                &[("on_conflict", "user_id,article_id".to_string())],
                "resolution=merge-duplicates,return=minimal",
            )
            .await;

        if let Err(e) = result {
            warn!(error = %e, article_id, "Failed to record reading history");
        }
    }

    /// Most recently read first. Empty for anonymous readers and on error.
    pub async fn reading_history(&self, token: Option<&str>, limit: usize) -> Vec<ReadingHistory> {
        let (Some(user), Some(token)) = (self.optional_user(token).await, token) else {
            return Vec::new();
        };

        let rows = self
            .select(
                READING_HISTORY,
                token,
                &[
                    ("select", "*".to_string()),
                    ("user_id", eq(user.id)),
                    ("order", "last_read_at.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await;

        match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to fetch reading history");
                Vec::new()
            }
        }
    }
}
