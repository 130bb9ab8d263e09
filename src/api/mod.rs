//! Retailer sales API integration
//!
//! This module is split across smaller files: wire types, token storage,
//! the authenticator and the accounts client.

pub mod auth;
pub mod client;
pub mod token;
pub mod types;

// Re-exports for the public API surface
pub use auth::Authenticator;
pub use client::AccountsClient;
pub use token::{OAuthToken, TokenStore};
pub use types::{AccountQuery, ContractAccount, Division, Snapshot, Tariff};

use crate::config::ApiConfig;
use crate::error::{HestiaError, Result};
use std::time::Duration;

/// API gateway deployments of the retailer portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Production,
    Development,
}

impl ApiEnvironment {
    fn host_id(self) -> &'static str {
        match self {
            Self::Production => "1kchpzz7aa",
            Self::Development => "awnl7rwekl",
        }
    }

    fn stage(self) -> &'static str {
        match self {
            Self::Production => "prod",
            Self::Development => "dev",
        }
    }

    /// Base URL including the deployment stage
    pub fn base_url(self) -> String {
        format!(
            "https://{}.execute-api.eu-central-1.amazonaws.com/{}",
            self.host_id(),
            self.stage()
        )
    }
}

impl std::str::FromStr for ApiEnvironment {
    type Err = HestiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            other => Err(HestiaError::config(format!(
                "Unknown API environment: {}",
                other
            ))),
        }
    }
}

/// Shared HTTP context handed to the authenticator and the accounts client
///
/// Owns the connection pool and the resolved base URL so that every component
/// talks to the same deployment with the same timeouts.
#[derive(Clone)]
pub struct ApiContext {
    http: reqwest::Client,
    base_url: String,
}

impl ApiContext {
    /// Build the context from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => config.environment.parse::<ApiEnvironment>()?.base_url(),
        };

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sign-in endpoint
    pub fn signin_url(&self) -> String {
        format!("{}/papi/auth/signin", self.base_url)
    }

    /// Token refresh endpoint
    pub fn refresh_url(&self) -> String {
        format!("{}/papi/auth/signin/refresh", self.base_url)
    }

    /// Contract accounts endpoint
    pub fn contract_accounts_url(&self) -> String {
        format!("{}/api/sap/action/contract-accounts", self.base_url)
    }
}
