//! Authenticated client for the contract accounts endpoint

use super::ApiContext;
use super::auth::Authenticator;
use super::types::{AccountQuery, ContractAccountsResponse, Division, Snapshot};
use crate::error::{HestiaError, Result};
use crate::logging::{StructuredLogger, get_logger};

/// Client for the contract accounts endpoint
///
/// Holds no state beyond its authenticator reference. Every fetch obtains a
/// valid token first and surfaces typed failures without retrying; retry
/// policy belongs to the polling session.
pub struct AccountsClient {
    context: ApiContext,
    authenticator: Authenticator,
    customer_nr: String,
    divisions: Vec<Division>,
    logger: StructuredLogger,
}

impl AccountsClient {
    /// Create a new accounts client
    ///
    /// `divisions` lists the divisions the configured subscribers need; an
    /// empty list requests the portal default selection.
    pub fn new(
        context: ApiContext,
        authenticator: Authenticator,
        customer_nr: &str,
        divisions: Vec<Division>,
    ) -> Self {
        Self {
            context,
            authenticator,
            customer_nr: customer_nr.to_string(),
            divisions,
            logger: get_logger("accounts"),
        }
    }

    /// Fetch the customer's contract accounts as a fresh snapshot
    ///
    /// An HTTP 401 invalidates the held token before the error is returned,
    /// so the next fetch forces a fresh login. A backend-level failure
    /// (`sapMessage.status != "S"`) surfaces as a typed error carrying the
    /// backend message text.
    pub async fn fetch_accounts(&self) -> Result<Snapshot> {
        let token = self.authenticator.get_token().await?;
        let query = AccountQuery::for_subscribers(&self.divisions);

        let response = self
            .context
            .http()
            .post(self.context.contract_accounts_url())
            .header("Authorization", &token.id_token)
            .header("Customer-Nr", &self.customer_nr)
            .json(&query)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.logger
                .warn("Accounts request rejected with HTTP 401, forcing re-login on next fetch");
            self.authenticator.invalidate();
            return Err(HestiaError::unauthorized(
                "bearer token rejected by accounts endpoint",
            ));
        }
        if !status.is_success() {
            self.logger
                .error(&format!("Accounts request failed: HTTP {}", status.as_u16()));
            return Err(HestiaError::server(status.as_u16()));
        }

        let text = response.text().await?;
        let body: ContractAccountsResponse = serde_json::from_str(&text)
            .map_err(|e| HestiaError::response_parse(format!("invalid accounts response: {}", e)))?;

        if !body.sap_message.is_success() {
            self.logger.error(&format!(
                "Backend rejected accounts request: {}",
                body.sap_message.text
            ));
            return Err(HestiaError::api_business(body.sap_message.text));
        }

        self.logger.debug(&format!(
            "Fetched {} contract accounts",
            body.contract_accounts.len()
        ));
        Ok(Snapshot::new(body.contract_accounts))
    }
}
