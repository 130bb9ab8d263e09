//! Error types and handling for Hestia
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Hestia operations
pub type Result<T> = std::result::Result<T, HestiaError>;

/// Main error type for Hestia
#[derive(Debug, Error)]
pub enum HestiaError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Login or refresh rejected by the auth endpoint
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Bearer token rejected by a resource endpoint (HTTP 401)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Malformed JSON or missing fields in an API response
    #[error("Response parse error: {message}")]
    ResponseParse { message: String },

    /// Transport succeeded but the backend reported a non-success status
    #[error("API business error: {text}")]
    ApiBusiness { text: String },

    /// Any other non-2xx response from the API
    #[error("Server error: HTTP {status}")]
    Server { status: u16 },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl HestiaError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        HestiaError::Config {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        HestiaError::Auth {
            message: message.into(),
        }
    }

    /// Create a new unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        HestiaError::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new response parse error
    pub fn response_parse<S: Into<String>>(message: S) -> Self {
        HestiaError::ResponseParse {
            message: message.into(),
        }
    }

    /// Create a new API business error carrying the backend message text
    pub fn api_business<S: Into<String>>(text: S) -> Self {
        HestiaError::ApiBusiness { text: text.into() }
    }

    /// Create a new server error from an HTTP status code
    pub fn server(status: u16) -> Self {
        HestiaError::Server { status }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        HestiaError::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        HestiaError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        HestiaError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        HestiaError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for HestiaError {
    fn from(err: std::io::Error) -> Self {
        HestiaError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for HestiaError {
    fn from(err: serde_yaml::Error) -> Self {
        HestiaError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HestiaError {
    fn from(err: serde_json::Error) -> Self {
        HestiaError::response_parse(err.to_string())
    }
}

impl From<reqwest::Error> for HestiaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HestiaError::timeout(err.to_string())
        } else if err.is_connect() {
            HestiaError::network(format!("connection failed: {}", err))
        } else {
            HestiaError::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HestiaError::auth("login rejected");
        assert!(matches!(err, HestiaError::Auth { .. }));

        let err = HestiaError::api_business("no accounts for customer");
        assert!(matches!(err, HestiaError::ApiBusiness { .. }));

        let err = HestiaError::validation("field", "test validation error");
        assert!(matches!(err, HestiaError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = HestiaError::config("test error");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Configuration error: test error");

        let err = HestiaError::server(503);
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Server error: HTTP 503");

        let err = HestiaError::validation("test_field", "invalid value");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Validation error: test_field - invalid value");
    }

    #[test]
    fn test_json_error_maps_to_response_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: HestiaError = json_err.into();
        assert!(matches!(err, HestiaError::ResponseParse { .. }));
    }
}
