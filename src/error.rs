//! Error types for the traffic watch server.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for traffic watch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Provider Errors ===
    /// Building or sending a request to the mapping provider failed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status} for {endpoint}")]
    ProviderHttp {
        /// The endpoint that was called, without credentials.
        endpoint: &'static str,
        /// HTTP status code returned.
        status: u16,
    },

    /// The provider answered but refused the query.
    #[error("provider status {status}: {message}")]
    ProviderStatus {
        /// Top-level status code, e.g. `REQUEST_DENIED`.
        status: String,
        /// Provider supplied error message, if any.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === I/O Errors ===
    /// Binding the listener or another I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file given on the command line does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigMissing {
        /// Path that was requested.
        path: PathBuf,
    },
}

/// A specialized Result type for traffic watch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a provider status error.
    #[must_use]
    pub fn provider_status(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderStatus {
            status: status.into(),
            message: message.into(),
        }
    }
}
