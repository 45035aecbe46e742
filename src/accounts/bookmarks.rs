use crate::accounts::client::SupabaseClient;
use crate::accounts::error::{AccountError, AccountResult};
use crate::accounts::links::LinkTable;
use crate::accounts::models::Bookmark;

const BOOKMARKS: LinkTable = LinkTable {
    table: "bookmarks",
    target_column: "article_id",
    duplicate: || AccountError::AlreadyBookmarked,
};

impl SupabaseClient {
    pub async fn add_bookmark(&self, token: Option<&str>, article_id: &str) -> AccountResult<Bookmark> {
        self.add_link(&BOOKMARKS, token, article_id).await
    }

    pub async fn remove_bookmark(&self, token: Option<&str>, article_id: &str) -> AccountResult<()> {
        self.remove_link(&BOOKMARKS, token, article_id).await
    }

    pub async fn bookmarks(&self, token: Option<&str>) -> AccountResult<Vec<Bookmark>> {
        self.list_links(&BOOKMARKS, token).await
    }

    pub async fn is_bookmarked(&self, token: Option<&str>, article_id: &str) -> bool {
        self.has_link(&BOOKMARKS, token, article_id).await
    }
}
