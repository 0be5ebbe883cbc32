//! Pure collaborators consumed by the analysis core
//!
//! Implementations must be safe to call concurrently.

use crate::{ContractError, NodeType};

/// Encodes a service identity into an opaque, stable id
pub trait IdentityEncoder: Send + Sync {
    /// Deterministic and injective on `(service_name, node_type)`
    fn encode_service_id(
        &self,
        service_name: &str,
        node_type: NodeType,
    ) -> Result<String, ContractError>;
}

/// Result of an endpoint name formatting attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    /// Whether a rule matched
    pub matched: bool,
    /// Formatted name when matched, otherwise the input name
    pub name: String,
}

impl FormatResult {
    pub fn matched(name: impl Into<String>) -> Self {
        Self {
            matched: true,
            name: name.into(),
        }
    }

    pub fn unmatched(name: impl Into<String>) -> Self {
        Self {
            matched: false,
            name: name.into(),
        }
    }
}

/// Rewrites raw endpoint names into their grouped form
pub trait EndpointNameFormatter: Send + Sync {
    fn format(&self, service_name: &str, endpoint: &str) -> Result<FormatResult, ContractError>;
}

/// Maps epoch milliseconds onto a minute time bucket
///
/// Must be monotonic non-decreasing and constant within any minute.
pub trait TimeBucketer: Send + Sync {
    fn minute_bucket(&self, epoch_millis: i64) -> Result<i64, ContractError>;
}
