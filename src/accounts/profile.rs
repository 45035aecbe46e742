use reqwest::Method;
use tracing::{info, warn};

use crate::accounts::client::{api_error, eq, SupabaseClient};
use crate::accounts::error::AccountResult;
use crate::accounts::models::{OAuthProvider, Profile};

impl SupabaseClient {
    /// Profile row of the signed-in reader. `None` when anonymous, when the
    /// token is invalid, or when the profile cannot be read.
    pub async fn current_profile(&self, token: Option<&str>) -> Option<Profile> {
        let (Some(user), Some(token)) = (self.optional_user(token).await, token) else {
            return None;
        };

        let rows = self
            .select::<Profile>(
                "profiles",
                token,
                &[("select", "*".to_string()), ("id", eq(user.id)), ("limit", "1".to_string())],
            )
            .await;

        match rows {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                warn!(error = %e, user_id = %user.id, "Failed to load profile");
                None
            }
        }
    }

    /// GoTrue authorize URL; the provider redirects back to `{origin}/auth/callback`.
    pub fn oauth_authorize_url(&self, provider: OAuthProvider, origin: &str) -> String {
        let redirect_to = format!("{}/auth/callback", origin.trim_end_matches('/'));
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}",
            self.base_url(),
            provider.as_str(),
            urlencoding::encode(&redirect_to)
        )
    }

    /// Revoke the session behind `token`.
    pub async fn sign_out(&self, token: &str) -> AccountResult<()> {
        let response = self.auth(Method::POST, "/logout", Some(token)).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        info!("Reader signed out");
        Ok(())
    }
}
