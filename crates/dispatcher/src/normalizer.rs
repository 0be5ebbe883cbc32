//! Metric normalization
//!
//! Applies endpoint naming rules of the destination service.

use std::sync::Arc;

use contracts::{ContractError, EndpointNameFormatter, ServiceMeshMetric};
use tracing::debug;

/// Normalized metric plus whether its endpoint was rewritten
#[derive(Debug, Clone)]
pub struct NormalizedMetric {
    pub metric: ServiceMeshMetric,
    pub renamed: bool,
}

/// Rewrites the endpoint name of incoming metrics
#[derive(Clone)]
pub struct MetricNormalizer {
    formatter: Arc<dyn EndpointNameFormatter>,
}

impl MetricNormalizer {
    pub fn new(formatter: Arc<dyn EndpointNameFormatter>) -> Self {
        Self { formatter }
    }

    /// Produce exactly one normalized metric
    ///
    /// The metric passes through unchanged unless a rule matches.
    ///
    /// # Errors
    /// Only formatter failures
    pub fn normalize(&self, mut metric: ServiceMeshMetric) -> Result<NormalizedMetric, ContractError> {
        let result = self
            .formatter
            .format(&metric.dest_service_name, &metric.endpoint)?;

        if !result.matched {
            return Ok(NormalizedMetric {
                metric,
                renamed: false,
            });
        }

        debug!(
            service = %metric.dest_service_name,
            from = %metric.endpoint,
            to = %result.name,
            "Endpoint renamed"
        );
        observability::record_endpoint_renamed(&metric.dest_service_name);

        metric.endpoint = result.name;
        Ok(NormalizedMetric {
            metric,
            renamed: true,
        })
    }
}
