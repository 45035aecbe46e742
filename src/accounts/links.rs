//! User-to-target link tables (`bookmarks`, `author_follows`) share one shape:
//! `(id, user_id, <target column>, created_at)` unique on the user/target pair.

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn};

use crate::accounts::client::{eq, SupabaseClient};
use crate::accounts::error::{AccountError, AccountResult};

pub(crate) struct LinkTable {
    pub table: &'static str,
    pub target_column: &'static str,
    pub duplicate: fn() -> AccountError,
}

impl SupabaseClient {
    pub(crate) async fn add_link<T: DeserializeOwned>(
        &self,
        link: &LinkTable,
        token: Option<&str>,
        target_id: &str,
    ) -> AccountResult<T> {
        let user = self.require_user(token).await?;
        let token = token.ok_or(AccountError::AuthRequired)?;

        let row = json!({ "user_id": user.id, link.target_column: target_id });
        let inserted = self
            .insert::<_, T>(link.table, token, &row, &[], "return=representation")
            .await
            .map_err(|e| if e.is_unique_violation() { (link.duplicate)() } else { e })?;

        info!(table = link.table, user_id = %user.id, target_id, "Link added");
        inserted.ok_or_else(|| AccountError::Api {
            status: 200,
            code: None,
            message: format!("{} insert returned no row", link.table),
        })
    }

    pub(crate) async fn remove_link(
        &self,
        link: &LinkTable,
        token: Option<&str>,
        target_id: &str,
    ) -> AccountResult<()> {
        let user = self.require_user(token).await?;
        let token = token.ok_or(AccountError::AuthRequired)?;

        self.delete(
            link.table,
            token,
            &[
                ("user_id", eq(user.id)),
                (link.target_column, eq(target_id)),
            ],
        )
        .await
    }

    /// Newest first; empty for anonymous readers.
    pub(crate) async fn list_links<T: DeserializeOwned>(
        &self,
        link: &LinkTable,
        token: Option<&str>,
    ) -> AccountResult<Vec<T>> {
        let (Some(user), Some(token)) = (self.optional_user(token).await, token) else {
            return Ok(Vec::new());
        };

        self.select(
            link.table,
            token,
            &[
                ("select", "*".to_string()),
                ("user_id", eq(user.id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// False for anonymous readers and on any error.
    pub(crate) async fn has_link(
        &self,
        link: &LinkTable,
        token: Option<&str>,
        target_id: &str,
    ) -> bool {
        let (Some(user), Some(token)) = (self.optional_user(token).await, token) else {
            return false;
        };

        let rows = self
            .select::<serde_json::Value>(
                link.table,
                token,
                &[
                    ("select", "id".to_string()),
                    ("user_id", eq(user.id)),
                    (link.target_column, eq(target_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await;

        match rows {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                warn!(error = %e, table = link.table, target_id, "Link lookup failed");
                false
            }
        }
    }
}
