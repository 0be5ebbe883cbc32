//! Service instance heartbeats
//!
//! Identity refresh for both ends of a call. No deduplication happens here;
//! storage upserts idempotently.

use std::sync::Arc;

use contracts::{ContractError, IdentityEncoder, NodeType, ServiceInstanceUpdate, ServiceMeshMetric};

#[derive(Clone)]
pub struct HeartbeatEmitter {
    identity: Arc<dyn IdentityEncoder>,
}

impl HeartbeatEmitter {
    pub fn new(identity: Arc<dyn IdentityEncoder>) -> Self {
        Self { identity }
    }

    /// Heartbeats of a metric, source side first
    ///
    /// Each side is emitted only when both its service and instance names are set.
    pub fn heartbeats(
        &self,
        metric: &ServiceMeshMetric,
        time_bucket: i64,
    ) -> Result<Vec<ServiceInstanceUpdate>, ContractError> {
        let mut updates = Vec::with_capacity(2);

        // Don't generate source heartbeat, if no source.
        if let Some(update) = self.heartbeat(
            &metric.source_service_name,
            &metric.source_service_instance,
            time_bucket,
        )? {
            updates.push(update);
        }

        if let Some(update) = self.heartbeat(
            &metric.dest_service_name,
            &metric.dest_service_instance,
            time_bucket,
        )? {
            updates.push(update);
        }

        Ok(updates)
    }

    fn heartbeat(
        &self,
        service_name: &str,
        instance_name: &str,
        time_bucket: i64,
    ) -> Result<Option<ServiceInstanceUpdate>, ContractError> {
        if service_name.is_empty() || instance_name.is_empty() {
            return Ok(None);
        }

        Ok(Some(ServiceInstanceUpdate {
            service_id: self
                .identity
                .encode_service_id(service_name, NodeType::Normal)?,
            name: instance_name.to_string(),
            time_bucket,
        }))
    }
}
