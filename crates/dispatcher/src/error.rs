//! Dispatcher error types

use contracts::SourceKind;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Receiver creation error
    #[error("failed to create receiver '{name}': {message}")]
    ReceiverCreation { name: String, message: String },

    /// Receiver rejected a source; sources emitted before it stay emitted
    #[error("failed to forward '{kind}' source: {source}")]
    Receive {
        kind: SourceKind,
        #[source]
        source: contracts::ContractError,
    },

    /// Collaborator error (formatter, identity encoder, time bucket)
    #[error("collaborator error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a receiver creation error
    pub fn receiver_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReceiverCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
