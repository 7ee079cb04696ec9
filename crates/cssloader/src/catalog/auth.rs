//! Catalog authentication state.
//!
//! The user pastes a 12-character short token from the catalog website. The
//! short token is exchanged for a full bearer token, which is valid for ten
//! minutes and refreshed on demand after that.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CatalogError, Result};

/// Required short token length.
pub const SHORT_TOKEN_LEN: usize = 12;

/// Settings key under which the short token is persisted.
pub const SHORT_TOKEN_KEY: &str = "shortToken";

/// How long a full token is treated as fresh after it was issued.
pub fn token_lifetime() -> TimeDelta {
    TimeDelta::minutes(10)
}

/// Reject short tokens of the wrong length.
pub fn validate_short_token(token: &str) -> Result<()> {
    let actual = token.chars().count();
    if actual != SHORT_TOKEN_LEN {
        return Err(CatalogError::InvalidToken {
            expected: SHORT_TOKEN_LEN,
            actual,
        });
    }
    Ok(())
}

/// Body of `/auth/authenticate_token` and `/auth/refresh_token` responses.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// The logged-in catalog user (`/auth/me`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Tokens and user data held while the daemon runs.
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    pub short_token: String,
    pub full_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub me: Option<UserInfo>,
}

/// What to do before an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No full token at all.
    Missing,
    /// Use this token as is.
    Fresh(String),
    /// Token expired; refresh with it.
    Expired(String),
}

impl TokenState {
    /// Record a newly issued full token.
    pub fn issue(&mut self, token: String, now: DateTime<Utc>) {
        self.full_token = Some(token);
        self.expires_at = Some(now + token_lifetime());
    }

    /// A token without an expiry never needs refreshing.
    pub fn status(&self, now: DateTime<Utc>) -> TokenStatus {
        match (&self.full_token, self.expires_at) {
            (None, _) => TokenStatus::Missing,
            (Some(token), None) => TokenStatus::Fresh(token.clone()),
            (Some(token), Some(expires_at)) if now < expires_at => {
                TokenStatus::Fresh(token.clone())
            }
            (Some(token), Some(_)) => TokenStatus::Expired(token.clone()),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
