//! Layered error definitions
//!
//! Categorized by source: config / receiver / collaborator

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Receiver Errors =====
    /// Receiver rejected a source
    #[error("receiver '{receiver_name}' error: {message}")]
    ReceiverWrite {
        receiver_name: String,
        message: String,
    },

    // ===== Collaborator Errors =====
    /// Identity encoding failed
    #[error("identity encoding error for service '{service_name}': {message}")]
    IdentityEncode {
        service_name: String,
        message: String,
    },

    /// Endpoint name formatting failed
    #[error("endpoint format error for service '{service_name}': {message}")]
    EndpointFormat {
        service_name: String,
        message: String,
    },

    /// Timestamp cannot be mapped onto a time bucket
    #[error("time bucket error: timestamp {epoch_millis}ms is out of range")]
    TimeBucket { epoch_millis: i64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create receiver write error
    pub fn receiver_write(receiver_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReceiverWrite {
            receiver_name: receiver_name.into(),
            message: message.into(),
        }
    }

    /// Create endpoint format error
    pub fn endpoint_format(service_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EndpointFormat {
            service_name: service_name.into(),
            message: message.into(),
        }
    }
}
