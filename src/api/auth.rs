//! Login, refresh and token lifecycle for the retailer API
//!
//! The authenticator owns the token store, serializes login exchanges and
//! keeps the token fresh with a background renewal task. Credentials are
//! supplied at construction and never logged.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ApiContext;
use super::token::{OAuthToken, TokenStore};
use super::types::TokenResponse;
use crate::error::{HestiaError, Result};
use crate::logging::{StructuredLogger, get_logger};

/// Token-owning client for the sign-in and refresh endpoints
///
/// Cheap to clone; clones share the token store and the renewal task.
#[derive(Clone)]
pub struct Authenticator {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    context: ApiContext,
    username: String,
    password: String,
    refresh_interval: Duration,
    store: TokenStore,
    login_lock: tokio::sync::Mutex<()>,
    renewal_task: Mutex<Option<JoinHandle<()>>>,
    logger: StructuredLogger,
}

impl Authenticator {
    /// Create a new authenticator
    ///
    /// `refresh_interval` is the cadence of the background renewal task that
    /// is armed on the first successful login.
    pub fn new(
        context: ApiContext,
        username: &str,
        password: &str,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                context,
                username: username.to_string(),
                password: password.to_string(),
                refresh_interval,
                store: TokenStore::new(),
                login_lock: tokio::sync::Mutex::new(()),
                renewal_task: Mutex::new(None),
                logger: get_logger("auth"),
            }),
        }
    }

    /// Return a currently valid token, logging in if necessary
    ///
    /// A valid cached token is returned without any network traffic.
    /// Concurrent callers that find no valid token resolve to a single
    /// login exchange.
    pub async fn get_token(&self) -> Result<OAuthToken> {
        if let Some(token) = self.inner.store.current()
            && token.is_valid()
        {
            return Ok(token);
        }

        let _guard = self.inner.login_lock.lock().await;

        // Another caller may have logged in while we waited for the lock
        if let Some(token) = self.inner.store.current()
            && token.is_valid()
        {
            return Ok(token);
        }

        let token = self.inner.login().await?;
        self.arm_renewal();
        Ok(token)
    }

    /// Drop the held token so the next `get_token` performs a fresh login
    ///
    /// Used when a resource endpoint rejects the bearer token. The renewal
    /// task stays armed.
    pub fn invalidate(&self) {
        self.inner.store.clear();
        self.inner.logger.debug("Token invalidated");
    }

    /// Whether the background renewal task is currently armed
    pub fn renewal_armed(&self) -> bool {
        self.inner
            .renewal_task
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Cancel the renewal task and release the token
    ///
    /// Idempotent. The next `get_token` after dispose performs a fresh
    /// login and re-arms the renewal task.
    pub fn dispose(&self) {
        if let Ok(mut guard) = self.inner.renewal_task.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
        self.inner.store.clear();
        self.inner.logger.debug("Authenticator disposed");
    }

    // Spawn the renewal task unless one is already running
    fn arm_renewal(&self) {
        let Ok(mut guard) = self.inner.renewal_task.lock() else {
            return;
        };
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; consume it so
            // the initial refresh runs one full period after login
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match inner.refresh().await {
                    Ok(()) => inner.logger.debug("Token refreshed in background"),
                    Err(e) => inner.logger.warn(&format!(
                        "Token refresh failed: {}; keeping current token, next fetch may re-login",
                        e
                    )),
                }
            }
        }));
        self.inner.logger.debug("Token renewal task armed");
    }
}

impl AuthInner {
    async fn login(&self) -> Result<OAuthToken> {
        self.logger
            .info(&format!("Logging in as {}", self.username));

        let response = self
            .context
            .http()
            .post(self.context.signin_url())
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            self.logger
                .error(&format!("Login rejected: HTTP {}", status.as_u16()));
            return Err(HestiaError::auth(format!(
                "login failed with HTTP {}",
                status.as_u16()
            )));
        }

        let text = response.text().await?;
        let body: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| HestiaError::response_parse(format!("invalid token response: {}", e)))?;
        let token = OAuthToken::from_response(&body, Utc::now());
        self.store.replace(token.clone());
        self.logger.info(&format!(
            "Login succeeded, token valid until {}",
            token.expires_at
        ));
        Ok(token)
    }

    async fn refresh(&self) -> Result<()> {
        let Some(held) = self.store.current() else {
            // Disposed or invalidated since the last tick; nothing to refresh
            return Ok(());
        };

        let response = self
            .context
            .http()
            .post(self.context.refresh_url())
            .json(&serde_json::json!({ "refreshToken": held.refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HestiaError::auth(format!(
                "refresh failed with HTTP {}",
                status.as_u16()
            )));
        }

        let text = response.text().await?;
        let body: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| HestiaError::response_parse(format!("invalid token response: {}", e)))?;
        self.store.replace(OAuthToken::from_response(&body, Utc::now()));
        Ok(())
    }
}
