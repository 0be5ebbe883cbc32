//! Service identity encoding

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use contracts::{ContractError, IdentityEncoder, NodeType};

/// Encodes a service id as `base64(name).{node type value}`
///
/// base64 never emits `.`, so the suffix is always recoverable and distinct
/// node types of one name never share an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceIdEncoder;

impl IdentityEncoder for ServiceIdEncoder {
    fn encode_service_id(
        &self,
        service_name: &str,
        node_type: NodeType,
    ) -> Result<String, ContractError> {
        Ok(format!(
            "{}.{}",
            STANDARD.encode(service_name),
            node_type.value()
        ))
    }
}
