//! Supabase REST access: GoTrue (`/auth/v1`) and PostgREST (`/rest/v1`).
//!
//! Every call is made on behalf of the reader whose access token is passed
//! in, so row-level security applies exactly as it would in the browser.

use std::time::Duration;

use anyhow::Context;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::accounts::error::{AccountError, AccountResult};
use crate::accounts::models::SupabaseUser;

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

impl SupabaseClient {
    pub fn new(url: &str, anon_key: SecretString) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create Supabase HTTP client")?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or_else(|| self.anon_key.expose_secret());
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(bearer)
    }

    pub(crate) fn auth(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        self.request(method, &format!("/auth/v1{path}"), token)
    }

    pub(crate) fn rest(&self, method: Method, table: &str, token: &str) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{table}"), Some(token))
    }

    /// The user behind `token`, or `None` when the token is rejected.
    pub async fn current_user(&self, token: &str) -> AccountResult<Option<SupabaseUser>> {
        let response = self.auth(Method::GET, "/user", Some(token)).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Access token rejected");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(api_error(response).await),
        }
    }

    /// Resolve the signed-in user or fail with [`AccountError::AuthRequired`].
    pub(crate) async fn require_user(&self, token: Option<&str>) -> AccountResult<SupabaseUser> {
        let token = token.ok_or(AccountError::AuthRequired)?;
        self.current_user(token)
            .await?
            .ok_or(AccountError::AuthRequired)
    }

    /// Like [`Self::current_user`] but treats every failure as anonymous.
    pub(crate) async fn optional_user(&self, token: Option<&str>) -> Option<SupabaseUser> {
        let token = token?;
        match self.current_user(token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to resolve Supabase user");
                None
            }
        }
    }

    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> AccountResult<Vec<T>> {
        let response = self.rest(Method::GET, table, token).query(query).send().await?;
        read_json(response).await
    }

    /// Insert a row and return it.
    pub(crate) async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        token: &str,
        row: &B,
        query: &[(&str, String)],
        prefer: &str,
    ) -> AccountResult<Option<T>> {
        let response = self
            .rest(Method::POST, table, token)
            .header("Prefer", prefer)
            .query(query)
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        // `return=minimal` answers with an empty body
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let mut rows: Vec<T> = serde_json::from_str(&body)?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    pub(crate) async fn delete(
        &self,
        table: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> AccountResult<()> {
        let response = self.rest(Method::DELETE, table, token).query(query).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

/// PostgREST equality filter value.
pub(crate) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

async fn read_json<T: DeserializeOwned>(response: Response) -> AccountResult<T> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(response.json().await?)
}

pub(crate) async fn api_error(response: Response) -> AccountError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AccountError::from_body(status, &body)
}
