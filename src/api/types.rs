//! Wire types for the retailer sales API
//!
//! Request and response bodies mirror the backend JSON exactly: request
//! division flags travel as the literal strings `"X"` and `""`, responses use
//! camelCase keys, and token expiry arrives as seconds in either a string or
//! a number.

use crate::error::{HestiaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Energy division of a contract or tariff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Division {
    Electricity,
    NaturalGas,
}

impl Division {
    /// Backend division code carried in tariff records
    pub fn code(self) -> &'static str {
        match self {
            Self::Electricity => "10",
            Self::NaturalGas => "60",
        }
    }
}

impl std::str::FromStr for Division {
    type Err = HestiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "electricity" => Ok(Self::Electricity),
            "naturalgas" => Ok(Self::NaturalGas),
            other => Err(HestiaError::config(format!("Unknown division: {}", other))),
        }
    }
}

// The backend encodes request booleans as "X" (set) or "" (clear)
fn ser_flag<S>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(if *value { "X" } else { "" })
}

/// Division selection sent with every contract accounts request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    #[serde(serialize_with = "ser_flag")]
    pub active: bool,
    #[serde(serialize_with = "ser_flag")]
    pub e_mobility: bool,
    #[serde(serialize_with = "ser_flag")]
    pub ega: bool,
    #[serde(serialize_with = "ser_flag")]
    pub electricity_feeders: bool,
    #[serde(serialize_with = "ser_flag")]
    pub natural_gas: bool,
    #[serde(serialize_with = "ser_flag")]
    pub sd: bool,
    #[serde(serialize_with = "ser_flag")]
    pub service: bool,
    #[serde(serialize_with = "ser_flag")]
    pub warmth: bool,
}

impl AccountQuery {
    /// The selection the retailer portal itself requests
    pub fn default_selection() -> Self {
        Self {
            active: true,
            electricity_feeders: true,
            natural_gas: true,
            ..Self::default()
        }
    }

    /// Selection with exactly one division flag set
    pub fn for_division(division: Division) -> Self {
        let mut query = Self::default();
        match division {
            // Electricity contracts are part of the base result set
            Division::Electricity => {}
            Division::NaturalGas => query.natural_gas = true,
        }
        query
    }

    /// Selection covering the divisions the configured subscribers need
    ///
    /// Active accounts are always requested; electricity subscribers add the
    /// feeder accounts, natural gas subscribers add the gas accounts. An
    /// empty division list falls back to the portal default selection.
    pub fn for_subscribers(divisions: &[Division]) -> Self {
        if divisions.is_empty() {
            return Self::default_selection();
        }
        let mut query = Self {
            active: true,
            ..Self::default()
        };
        for division in divisions {
            match division {
                Division::Electricity => query.electricity_feeders = true,
                Division::NaturalGas => query.natural_gas = true,
            }
        }
        query
    }
}

// Token expiry arrives as seconds in either a JSON string or a number
fn de_seconds<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
    }
}

/// Body of a successful sign-in or refresh exchange
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "de_seconds")]
    pub expire_in: i64,
}

/// Backend processing status attached to every accounts response
#[derive(Debug, Clone, Deserialize)]
pub struct SapMessage {
    pub status: String,
    #[serde(default)]
    pub text: String,
}

impl SapMessage {
    /// Whether the backend reported success
    pub fn is_success(&self) -> bool {
        self.status == "S"
    }
}

/// Envelope of the contract accounts endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAccountsResponse {
    pub sap_message: SapMessage,
    #[serde(default)]
    pub contract_accounts: Vec<ContractAccount>,
}

/// One billing account with its tariffs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAccount {
    pub contract_account_nr: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub electricity: bool,
    #[serde(default)]
    pub natural_gas: bool,
    #[serde(default)]
    pub warmth: bool,
    #[serde(default)]
    pub e_mobility: bool,
    #[serde(default)]
    pub service: bool,
    #[serde(default)]
    pub bank_description: Option<String>,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub e_billing: bool,
    #[serde(default)]
    pub wind_account: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub electricity_feeder: bool,
    #[serde(default)]
    pub tariffs: Vec<Tariff>,
}

/// One priced plan attached to a contract account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    #[serde(default)]
    pub installation: String,
    pub division: String,
    #[serde(default)]
    pub tariff_type: String,
    #[serde(default)]
    pub tariff_name: String,
    #[serde(default)]
    pub electricity_warmth: bool,
    #[serde(default)]
    pub tariff_segment: String,
    pub work_price: f64,
    pub base_price: f64,
    #[serde(default)]
    pub bound_until: String,
    #[serde(default)]
    pub price_guarantee_until: String,
}

/// Result of one successful poll cycle
///
/// Replaced wholesale by the next successful poll and retained across failed
/// ones, so consumers always see the last known-good data.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub accounts: Vec<ContractAccount>,
    pub retrieved_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(accounts: Vec<ContractAccount>) -> Self {
        Self {
            accounts,
            retrieved_at: Utc::now(),
        }
    }

    /// Look up an account by its contract account number
    pub fn find(&self, contract_account_nr: &str) -> Option<&ContractAccount> {
        self.accounts
            .iter()
            .find(|a| a.contract_account_nr == contract_account_nr)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_codes() {
        assert_eq!(Division::Electricity.code(), "10");
        assert_eq!(Division::NaturalGas.code(), "60");
        assert_eq!("naturalgas".parse::<Division>().unwrap(), Division::NaturalGas);
        assert_eq!("Electricity".parse::<Division>().unwrap(), Division::Electricity);
        assert!("water".parse::<Division>().is_err());
    }

    #[test]
    fn test_default_selection_serialization() {
        let query = AccountQuery::default_selection();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["active"], "X");
        assert_eq!(json["eMobility"], "");
        assert_eq!(json["ega"], "");
        assert_eq!(json["electricityFeeders"], "X");
        assert_eq!(json["naturalGas"], "X");
        assert_eq!(json["sd"], "");
        assert_eq!(json["service"], "");
        assert_eq!(json["warmth"], "");
    }

    #[test]
    fn test_natural_gas_query_sets_only_that_flag() {
        let query = AccountQuery::for_division(Division::NaturalGas);
        let json = serde_json::to_value(&query).unwrap();
        for (key, value) in json.as_object().unwrap() {
            if key == "naturalGas" {
                assert_eq!(value, "X");
            } else {
                assert_eq!(value, "", "flag {} should be clear", key);
            }
        }
    }

    #[test]
    fn test_subscriber_query_unions_divisions() {
        let query =
            AccountQuery::for_subscribers(&[Division::Electricity, Division::NaturalGas]);
        assert!(query.active);
        assert!(query.electricity_feeders);
        assert!(query.natural_gas);
        assert!(!query.warmth);

        let query = AccountQuery::for_subscribers(&[Division::NaturalGas]);
        assert!(query.active);
        assert!(!query.electricity_feeders);
        assert!(query.natural_gas);

        // No subscribers falls back to the portal default
        let query = AccountQuery::for_subscribers(&[]);
        assert_eq!(query, AccountQuery::default_selection());
    }

    #[test]
    fn test_token_response_accepts_string_and_number_expiry() {
        let body = r#"{"idToken":"id","accessToken":"at","refreshToken":"rt","expireIn":"3600"}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.expire_in, 3600);
        assert_eq!(parsed.id_token, "id");

        let body = r#"{"idToken":"id","accessToken":"at","refreshToken":"rt","expireIn":1800}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.expire_in, 1800);
    }

    #[test]
    fn test_token_response_rejects_missing_fields() {
        let body = r#"{"idToken":"id","expireIn":"3600"}"#;
        assert!(serde_json::from_str::<TokenResponse>(body).is_err());

        let body = r#"{"idToken":"id","accessToken":"at","refreshToken":"rt","expireIn":"soon"}"#;
        assert!(serde_json::from_str::<TokenResponse>(body).is_err());
    }

    #[test]
    fn test_contract_accounts_response_parsing() {
        let body = r#"{
            "sapMessage": {"status": "S", "text": "OK"},
            "contractAccounts": [{
                "contractAccountNr": "410012345",
                "description": "Hauptstrasse 1, 7000 Eisenstadt",
                "electricity": true,
                "naturalGas": false,
                "isActive": true,
                "electricityFeeder": false,
                "bankDescription": "Bank Burgenland",
                "bankId": "0001",
                "tariffs": [{
                    "installation": "4000898001",
                    "division": "10",
                    "tariffType": "ST",
                    "tariffName": "Strom Basic",
                    "electricityWarmth": false,
                    "tariffSegment": "PRIVAT",
                    "workPrice": 0.18,
                    "basePrice": 5.5,
                    "boundUntil": "2026-12-31",
                    "priceGuaranteeUntil": "2026-06-30"
                }]
            }]
        }"#;

        let parsed: ContractAccountsResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.sap_message.is_success());
        assert_eq!(parsed.contract_accounts.len(), 1);

        let account = &parsed.contract_accounts[0];
        assert_eq!(account.contract_account_nr, "410012345");
        assert!(account.electricity);
        assert!(account.is_active);
        assert_eq!(account.bank_id.as_deref(), Some("0001"));
        assert_eq!(account.tariffs.len(), 1);

        let tariff = &account.tariffs[0];
        assert_eq!(tariff.division, Division::Electricity.code());
        assert!((tariff.work_price - 0.18).abs() < f64::EPSILON);
        assert!((tariff.base_price - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_business_failure_envelope_parsing() {
        let body = r#"{"sapMessage": {"status": "E", "text": "Kundennummer unbekannt"}}"#;
        let parsed: ContractAccountsResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.sap_message.is_success());
        assert_eq!(parsed.sap_message.text, "Kundennummer unbekannt");
        assert!(parsed.contract_accounts.is_empty());
    }

    #[test]
    fn test_snapshot_lookup() {
        let body = r#"{
            "sapMessage": {"status": "S", "text": ""},
            "contractAccounts": [
                {"contractAccountNr": "1", "isActive": true},
                {"contractAccountNr": "2", "isActive": false}
            ]
        }"#;
        let parsed: ContractAccountsResponse = serde_json::from_str(body).unwrap();
        let snapshot = Snapshot::new(parsed.contract_accounts);

        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.is_empty());
        assert!(snapshot.find("2").is_some());
        assert!(snapshot.find("3").is_none());
    }
}
