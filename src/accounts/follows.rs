use crate::accounts::client::SupabaseClient;
use crate::accounts::error::{AccountError, AccountResult};
use crate::accounts::links::LinkTable;
use crate::accounts::models::AuthorFollow;

const AUTHOR_FOLLOWS: LinkTable = LinkTable {
    table: "author_follows",
    target_column: "author_id",
    duplicate: || AccountError::AlreadyFollowing,
};

impl SupabaseClient {
    pub async fn follow_author(&self, token: Option<&str>, author_id: &str) -> AccountResult<AuthorFollow> {
        self.add_link(&AUTHOR_FOLLOWS, token, author_id).await
    }

    pub async fn unfollow_author(&self, token: Option<&str>, author_id: &str) -> AccountResult<()> {
        self.remove_link(&AUTHOR_FOLLOWS, token, author_id).await
    }

    pub async fn followed_authors(&self, token: Option<&str>) -> AccountResult<Vec<AuthorFollow>> {
        self.list_links(&AUTHOR_FOLLOWS, token).await
    }

    pub async fn is_following(&self, token: Option<&str>, author_id: &str) -> bool {
        self.has_link(&AUTHOR_FOLLOWS, token, author_id).await
    }
}
