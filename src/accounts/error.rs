use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Postgres unique-violation code, surfaced by PostgREST on duplicate inserts.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("認証が必要です")]
    AuthRequired,

    #[error("既にブックマーク済みです")]
    AlreadyBookmarked,

    #[error("既にフォロー済みです")]
    AlreadyFollowing,

    #[error("Supabase API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Supabase request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected Supabase response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AccountError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Api { code: Some(code), .. } if code == UNIQUE_VIOLATION)
    }

    /// Build an API error from a non-success response body.
    pub(crate) fn from_body(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            code: Option<String>,
            message: Option<String>,
            msg: Option<String>,
            error_description: Option<String>,
        }

        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let (code, message) = match parsed {
            Some(b) => (
                b.code,
                b.message
                    .or(b.msg)
                    .or(b.error_description)
                    .unwrap_or_else(|| body.to_string()),
            ),
            None => (None, body.to_string()),
        };

        Self::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }
}

pub type AccountResult<T> = std::result::Result<T, AccountError>;
