//! Bearer token storage and validity tracking

use super::types::TokenResponse;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::RwLock;

/// OAuth2 token set with its absolute expiry instant
#[derive(Clone)]
pub struct OAuthToken {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Build a token from an exchange response received at `issued_at`
    pub fn from_response(response: &TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            id_token: response.id_token.clone(),
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: issued_at + Duration::seconds(response.expire_in),
        }
    }

    /// Whether the token is still valid at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether the token is still valid right now
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

// Manual Debug so raw token material never reaches log output
impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("id_token", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holder of the current token
///
/// Shared between the foreground `get_token` caller and the background
/// renewal task. Tokens are replaced wholesale under a short write lock;
/// no field is ever mutated in place.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<Option<OAuthToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a token is present and valid at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.inner
            .read()
            .map(|guard| guard.as_ref().is_some_and(|t| t.is_valid_at(now)))
            .unwrap_or(false)
    }

    /// Whether a token is present and valid right now
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Clone of the held token, if any
    pub fn current(&self) -> Option<OAuthToken> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    /// Atomically swap in a new token
    pub fn replace(&self, token: OAuthToken) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(token);
        }
    }

    /// Drop the held token
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }
}
