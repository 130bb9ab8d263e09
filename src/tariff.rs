//! Tariff selection and publication
//!
//! Each configured tariff endpoint picks one tariff out of a snapshot and
//! publishes its delivery address, name and taxed prices. Selection is by
//! division code plus a classification that narrows which of the account's
//! tariffs applies.

use std::sync::Arc;

use crate::api::{ContractAccount, Division, Snapshot, Tariff};
use crate::config::TariffConfig;
use crate::error::{HestiaError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::publish::{
    BridgeStatus, CHANNEL_DELIVERY_ADDRESS, CHANNEL_PRICE_BASE, CHANNEL_PRICE_KWH,
    CHANNEL_TARIFF_NAME, ChannelValue, OfflineReason, StatusSink, ValueSink,
};
use crate::session::SnapshotListener;

/// Which of an account's tariffs a subscriber is after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TariffClassification {
    #[default]
    Default,
    Heating,
    FeedIn,
}

impl std::str::FromStr for TariffClassification {
    type Err = HestiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "heating" => Ok(Self::Heating),
            "feedin" => Ok(Self::FeedIn),
            other => Err(HestiaError::config(format!(
                "Unknown tariff classification: {}",
                other
            ))),
        }
    }
}

/// Tax factor applied to published prices
///
/// Feed-in accounts are settled without the consumption tax.
pub fn tax_factor(is_feeder: bool) -> f64 {
    if is_feeder { 1.0 } else { 1.2 }
}

/// Price with the applicable tax factor applied
pub fn taxed(price: f64, is_feeder: bool) -> f64 {
    price * tax_factor(is_feeder)
}

/// Picks the account and tariff a configured endpoint publishes
#[derive(Debug, Clone)]
pub struct TariffSelector {
    pub division: Division,
    pub classification: TariffClassification,
    pub electrical_heating: bool,
    pub contract_account_nr: Option<String>,
}

impl TariffSelector {
    pub fn from_config(config: &TariffConfig) -> Result<Self> {
        let division: Division = config.division.parse()?;
        let classification: TariffClassification = config.classification.parse()?;
        if division == Division::NaturalGas && classification == TariffClassification::FeedIn {
            return Err(HestiaError::validation(
                "classification",
                "feedin applies to electricity tariffs only",
            ));
        }
        Ok(Self {
            division,
            classification,
            electrical_heating: config.electrical_heating,
            contract_account_nr: config.contract_account_nr.clone(),
        })
    }

    /// First matching account and tariff in snapshot order
    pub fn select<'a>(&self, snapshot: &'a Snapshot) -> Option<(&'a ContractAccount, &'a Tariff)> {
        for account in &snapshot.accounts {
            if !account.is_active {
                continue;
            }
            if let Some(nr) = &self.contract_account_nr
                && account.contract_account_nr != *nr
            {
                continue;
            }
            for tariff in &account.tariffs {
                if self.matches(account, tariff) {
                    return Some((account, tariff));
                }
            }
        }
        None
    }

    fn matches(&self, account: &ContractAccount, tariff: &Tariff) -> bool {
        if tariff.division != self.division.code() {
            return false;
        }
        match self.division {
            Division::Electricity => match self.classification {
                TariffClassification::Heating => tariff.electricity_warmth,
                TariffClassification::FeedIn => account.electricity_feeder,
                TariffClassification::Default => {
                    !account.electricity_feeder && !tariff.electricity_warmth
                }
            },
            Division::NaturalGas => self.electrical_heating == tariff.electricity_warmth,
        }
    }
}

/// Publishes one selected tariff on every snapshot
pub struct TariffSubscriber {
    selector: TariffSelector,
    status_sink: Arc<dyn StatusSink>,
    value_sink: Arc<dyn ValueSink>,
    logger: StructuredLogger,
}

impl TariffSubscriber {
    pub fn new(
        selector: TariffSelector,
        status_sink: Arc<dyn StatusSink>,
        value_sink: Arc<dyn ValueSink>,
    ) -> Self {
        let mut context = LogContext::new("tariff").with_field(
            "division",
            format!("{:?}", selector.division).to_lowercase(),
        );
        if let Some(nr) = &selector.contract_account_nr {
            context = context.with_account_nr(nr.clone());
        }
        Self {
            selector,
            status_sink,
            value_sink,
            logger: get_logger_with_context(context),
        }
    }

    pub fn selector(&self) -> &TariffSelector {
        &self.selector
    }
}

impl SnapshotListener for TariffSubscriber {
    fn on_snapshot(&self, snapshot: &Snapshot) {
        match self.selector.select(snapshot) {
            Some((account, tariff)) => {
                let is_feeder = account.electricity_feeder;
                self.value_sink.update_value(
                    CHANNEL_DELIVERY_ADDRESS,
                    ChannelValue::Text(account.description.clone()),
                );
                self.value_sink.update_value(
                    CHANNEL_TARIFF_NAME,
                    ChannelValue::Text(tariff.tariff_name.clone()),
                );
                self.value_sink.update_value(
                    CHANNEL_PRICE_KWH,
                    ChannelValue::Decimal(taxed(tariff.work_price, is_feeder)),
                );
                self.value_sink.update_value(
                    CHANNEL_PRICE_BASE,
                    ChannelValue::Decimal(taxed(tariff.base_price, is_feeder)),
                );
                self.status_sink.update_status(BridgeStatus::Online);
                self.logger.debug(&format!(
                    "Published tariff '{}' from account {}",
                    tariff.tariff_name, account.contract_account_nr
                ));
            }
            None => {
                self.logger.warn(&format!(
                    "No matching tariff in snapshot ({:?}/{:?})",
                    self.selector.division, self.selector.classification
                ));
                self.status_sink
                    .update_status(BridgeStatus::Offline(OfflineReason::Configuration));
            }
        }
    }
}
