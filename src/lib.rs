//! # Hestia - Energy Tariff Bridge
//!
//! A Rust bridge to an energy retailer's customer portal API, keeping the
//! retailer's contract accounts and tariff prices available to a local host
//! platform through periodic polling.
//!
//! ## Features
//!
//! - **OAuth2 Lifecycle**: Sign-in, cached tokens and background refresh
//! - **Periodic Polling**: Single in-flight fetch with a fixed cadence
//! - **Snapshot Fan-Out**: Fresh account data pushed to all subscribers
//! - **Tariff Selection**: Division and classification rules with taxed prices
//! - **Configuration**: YAML-based configuration with validation
//! - **Structured Logging**: Component-scoped context fields
//!
//! ## Architecture
//!
//! The crate follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `error`: Error taxonomy shared across the crate
//! - `api`: Sign-in, token storage and the accounts endpoint client
//! - `session`: Polling lifecycle and snapshot fan-out
//! - `tariff`: Tariff selection rules and publication
//! - `publish`: Status and value sinks towards the host platform

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod publish;
pub mod session;
pub mod tariff;

// Re-export commonly used types
pub use config::Config;
pub use error::{HestiaError, Result};
pub use session::PollingSession;
