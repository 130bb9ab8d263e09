//! Collaborator seams towards the host platform
//!
//! The core reports reachability and publishes channel values through these
//! traits on every poll; how the host renders them is not its concern.

use crate::error::HestiaError;
use crate::logging::{StructuredLogger, get_logger};

/// Channel id for the delivery address of the matched account
pub const CHANNEL_DELIVERY_ADDRESS: &str = "delivery-address";
/// Channel id for the tariff name
pub const CHANNEL_TARIFF_NAME: &str = "name";
/// Channel id for the taxed work price per kWh
pub const CHANNEL_PRICE_KWH: &str = "price-kwh";
/// Channel id for the taxed base price
pub const CHANNEL_PRICE_BASE: &str = "price-base";

/// Why a consumer-facing endpoint went offline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineReason {
    Configuration,
    Communication,
    Unknown,
}

impl OfflineReason {
    /// Map a poll failure to the reason reported outward
    pub fn classify(error: &HestiaError) -> Self {
        match error {
            HestiaError::Auth { .. }
            | HestiaError::Config { .. }
            | HestiaError::Validation { .. } => Self::Configuration,
            HestiaError::Unauthorized { .. }
            | HestiaError::Server { .. }
            | HestiaError::Network { .. }
            | HestiaError::Timeout { .. } => Self::Communication,
            _ => Self::Unknown,
        }
    }
}

/// Reachability reported to the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Unknown,
    Online,
    Offline(OfflineReason),
}

/// Value published on a named channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    Text(String),
    Decimal(f64),
}

/// Sink for reachability transitions
pub trait StatusSink: Send + Sync {
    fn update_status(&self, status: BridgeStatus);
}

/// Sink for named channel values
pub trait ValueSink: Send + Sync {
    fn update_value(&self, channel: &str, value: ChannelValue);
}

/// Default sink that renders transitions and values into the log
pub struct LogPublisher {
    logger: StructuredLogger,
}

impl LogPublisher {
    pub fn new(component: &str) -> Self {
        Self {
            logger: get_logger(component),
        }
    }
}

impl StatusSink for LogPublisher {
    fn update_status(&self, status: BridgeStatus) {
        match status {
            BridgeStatus::Online => self.logger.info("Status: online"),
            BridgeStatus::Unknown => self.logger.info("Status: unknown"),
            BridgeStatus::Offline(reason) => {
                self.logger.warn(&format!("Status: offline ({:?})", reason));
            }
        }
    }
}

impl ValueSink for LogPublisher {
    fn update_value(&self, channel: &str, value: ChannelValue) {
        match value {
            ChannelValue::Text(v) => self.logger.info(&format!("{} = {}", channel, v)),
            ChannelValue::Decimal(v) => self.logger.info(&format!("{} = {:.4}", channel, v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_reason_classification() {
        assert_eq!(
            OfflineReason::classify(&HestiaError::auth("bad credentials")),
            OfflineReason::Configuration
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::validation("field", "bad")),
            OfflineReason::Configuration
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::unauthorized("rejected")),
            OfflineReason::Communication
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::server(503)),
            OfflineReason::Communication
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::network("refused")),
            OfflineReason::Communication
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::timeout("deadline")),
            OfflineReason::Communication
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::api_business("rejected")),
            OfflineReason::Unknown
        );
        assert_eq!(
            OfflineReason::classify(&HestiaError::response_parse("bad json")),
            OfflineReason::Unknown
        );
    }

    #[test]
    fn test_log_publisher_accepts_all_statuses() {
        let publisher = LogPublisher::new("test");
        publisher.update_status(BridgeStatus::Unknown);
        publisher.update_status(BridgeStatus::Online);
        publisher.update_status(BridgeStatus::Offline(OfflineReason::Communication));
        publisher.update_value(CHANNEL_TARIFF_NAME, ChannelValue::Text("Basic".to_string()));
        publisher.update_value(CHANNEL_PRICE_KWH, ChannelValue::Decimal(0.216));
    }
}
