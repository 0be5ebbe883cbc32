//! TelemetryDataDispatcher - fans one mesh metric out into sources
//!
//! Per metric, in order:
//! 1. the minute time bucket is computed once
//! 2. heartbeats for the source and destination instances
//! 3. node sources (All, Service, ServiceInstance, Endpoint) for server-side reports
//! 4. relation sources (ServiceRelation, ServiceInstanceRelation) when a source service is known
//!
//! Dispatch is synchronous and holds no mutable state, so one dispatcher can
//! be shared by any number of ingestion threads.

use std::sync::Arc;

use contracts::{
    All, EndpointNameFormatter, IdentityEncoder, LatencyTimer, NodeType, ServiceMeshMetric,
    Endpoint, Service, ServiceInstance, ServiceInstanceRelation, ServiceRelation, Source,
    SourceKind, SourceReceiver, TimeBucketer, TimerGuard, WireDetectPoint,
};
use observability::HistogramLatencyTimer;
use tracing::{instrument, trace};

use crate::error::DispatcherError;
use crate::heartbeat::HeartbeatEmitter;
use crate::identity::ServiceIdEncoder;
use crate::mapping::{map_detect_point, protocol_to_component, protocol_to_type};
use crate::naming::EndpointNamingRules;
use crate::normalizer::MetricNormalizer;
use crate::time_bucket::MinuteTimeBucket;

/// Upper bound of sources per metric: 2 heartbeats, 4 node, 2 relation
pub const MAX_SOURCES_PER_METRIC: usize = 8;

/// Collaborators a dispatcher is wired with
///
/// Set once at startup; nothing here is mutated afterwards.
#[derive(Clone)]
pub struct DispatchContext {
    pub receiver: Arc<dyn SourceReceiver>,
    pub formatter: Arc<dyn EndpointNameFormatter>,
    pub identity: Arc<dyn IdentityEncoder>,
    pub bucketer: Arc<dyn TimeBucketer>,
    pub timer: Arc<dyn LatencyTimer>,
}

/// Builder for creating a TelemetryDataDispatcher
pub struct DispatcherBuilder {
    receiver: Arc<dyn SourceReceiver>,
    formatter: Option<Arc<dyn EndpointNameFormatter>>,
    identity: Option<Arc<dyn IdentityEncoder>>,
    bucketer: Option<Arc<dyn TimeBucketer>>,
    timer: Option<Arc<dyn LatencyTimer>>,
}

impl DispatcherBuilder {
    pub fn new(receiver: Arc<dyn SourceReceiver>) -> Self {
        Self {
            receiver,
            formatter: None,
            identity: None,
            bucketer: None,
            timer: None,
        }
    }

    pub fn formatter(mut self, formatter: Arc<dyn EndpointNameFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityEncoder>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn bucketer(mut self, bucketer: Arc<dyn TimeBucketer>) -> Self {
        self.bucketer = Some(bucketer);
        self
    }

    pub fn timer(mut self, timer: Arc<dyn LatencyTimer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Build the dispatcher, filling unset collaborators with defaults
    pub fn build(self) -> TelemetryDataDispatcher {
        TelemetryDataDispatcher::new(DispatchContext {
            receiver: self.receiver,
            formatter: self
                .formatter
                .unwrap_or_else(|| Arc::new(EndpointNamingRules::new())),
            identity: self.identity.unwrap_or_else(|| Arc::new(ServiceIdEncoder)),
            bucketer: self.bucketer.unwrap_or_else(|| Arc::new(MinuteTimeBucket)),
            timer: self
                .timer
                .unwrap_or_else(|| Arc::new(HistogramLatencyTimer::default())),
        })
    }
}

/// What a single `process`/`dispatch` call emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Minute bucket shared by every emitted source
    pub time_bucket: i64,
    /// Kinds forwarded to the receiver, in emission order
    pub emitted: Vec<SourceKind>,
    /// Whether naming rules rewrote the endpoint
    pub endpoint_renamed: bool,
}

/// Service mesh telemetry dispatcher
pub struct TelemetryDataDispatcher {
    receiver: Arc<dyn SourceReceiver>,
    normalizer: MetricNormalizer,
    heartbeat: HeartbeatEmitter,
    bucketer: Arc<dyn TimeBucketer>,
    timer: Arc<dyn LatencyTimer>,
}

impl TelemetryDataDispatcher {
    pub fn new(context: DispatchContext) -> Self {
        Self {
            receiver: context.receiver,
            normalizer: MetricNormalizer::new(context.formatter),
            heartbeat: HeartbeatEmitter::new(context.identity),
            bucketer: context.bucketer,
            timer: context.timer,
        }
    }

    pub fn builder(receiver: Arc<dyn SourceReceiver>) -> DispatcherBuilder {
        DispatcherBuilder::new(receiver)
    }

    /// Normalize then dispatch one metric, inside one latency measurement
    ///
    /// The measurement is finished on every exit path.
    ///
    /// # Errors
    /// The first collaborator or receiver failure, unchanged
    #[instrument(
        name = "mesh_dispatcher_process",
        skip(self, metric),
        fields(dest_service = %metric.dest_service_name)
    )]
    pub fn process(&self, metric: ServiceMeshMetric) -> Result<DispatchOutcome, DispatcherError> {
        let _timer = TimerGuard::start(self.timer.as_ref());

        let normalized = self.normalizer.normalize(metric)?;
        let mut outcome = self.dispatch(&normalized.metric)?;
        outcome.endpoint_renamed = normalized.renamed;
        Ok(outcome)
    }

    /// Fan an already normalized metric out to the receiver
    pub fn dispatch(&self, metric: &ServiceMeshMetric) -> Result<DispatchOutcome, DispatcherError> {
        let time_bucket = self.bucketer.minute_bucket(metric.start_time)?;
        let mut emitted = Vec::with_capacity(MAX_SOURCES_PER_METRIC);

        for update in self.heartbeat.heartbeats(metric, time_bucket)? {
            self.emit(Source::ServiceInstanceUpdate(update), &mut emitted)?;
        }

        // Only the server side reports node traffic, otherwise a call seen by
        // both sidecars would be counted twice.
        if metric.detect_point == WireDetectPoint::Server {
            self.emit(Source::All(to_all(metric, time_bucket)), &mut emitted)?;
            self.emit(Source::Service(to_service(metric, time_bucket)), &mut emitted)?;
            self.emit(
                Source::ServiceInstance(to_service_instance(metric, time_bucket)),
                &mut emitted,
            )?;
            self.emit(Source::Endpoint(to_endpoint(metric, time_bucket)), &mut emitted)?;
        }

        // Don't generate relation, if no source. The destination side is not checked.
        if !metric.source_service_name.is_empty() {
            self.emit(
                Source::ServiceRelation(to_service_relation(metric, time_bucket)),
                &mut emitted,
            )?;
            self.emit(
                Source::ServiceInstanceRelation(to_service_instance_relation(metric, time_bucket)),
                &mut emitted,
            )?;
        }

        Ok(DispatchOutcome {
            time_bucket,
            emitted,
            endpoint_renamed: false,
        })
    }

    fn emit(&self, source: Source, emitted: &mut Vec<SourceKind>) -> Result<(), DispatcherError> {
        let kind = source.kind();
        self.receiver
            .receive(source)
            .map_err(|source| DispatcherError::Receive { kind, source })?;

        trace!(kind = %kind, "Source forwarded");
        observability::record_source_emitted(kind);
        emitted.push(kind);
        Ok(())
    }
}

fn to_all(metric: &ServiceMeshMetric, time_bucket: i64) -> All {
    All {
        time_bucket,
        name: metric.dest_service_name.clone(),
        service_instance_name: metric.dest_service_instance.clone(),
        endpoint_name: metric.endpoint.clone(),
        latency: metric.latency,
        status: metric.status,
        response_code: metric.response_code,
        request_type: protocol_to_type(metric.protocol),
    }
}

fn to_service(metric: &ServiceMeshMetric, time_bucket: i64) -> Service {
    Service {
        time_bucket,
        name: metric.dest_service_name.clone(),
        node_type: NodeType::Normal,
        service_instance_name: metric.dest_service_instance.clone(),
        endpoint_name: metric.endpoint.clone(),
        latency: metric.latency,
        status: metric.status,
        response_code: metric.response_code,
        request_type: protocol_to_type(metric.protocol),
    }
}

fn to_service_instance(metric: &ServiceMeshMetric, time_bucket: i64) -> ServiceInstance {
    ServiceInstance {
        time_bucket,
        name: metric.dest_service_instance.clone(),
        service_name: metric.dest_service_name.clone(),
        node_type: NodeType::Normal,
        endpoint_name: metric.endpoint.clone(),
        latency: metric.latency,
        status: metric.status,
        response_code: metric.response_code,
        request_type: protocol_to_type(metric.protocol),
    }
}

fn to_endpoint(metric: &ServiceMeshMetric, time_bucket: i64) -> Endpoint {
    Endpoint {
        time_bucket,
        name: metric.endpoint.clone(),
        service_name: metric.dest_service_name.clone(),
        service_node_type: NodeType::Normal,
        service_instance_name: metric.dest_service_instance.clone(),
        latency: metric.latency,
        status: metric.status,
        response_code: metric.response_code,
        request_type: protocol_to_type(metric.protocol),
    }
}

fn to_service_relation(metric: &ServiceMeshMetric, time_bucket: i64) -> ServiceRelation {
    ServiceRelation {
        time_bucket,
        source_service_name: metric.source_service_name.clone(),
        source_service_node_type: NodeType::Normal,
        source_service_instance_name: metric.source_service_instance.clone(),
        dest_service_name: metric.dest_service_name.clone(),
        dest_service_node_type: NodeType::Normal,
        dest_service_instance_name: metric.dest_service_instance.clone(),
        endpoint: metric.endpoint.clone(),
        latency: metric.latency,
        status: metric.status,
        response_code: metric.response_code,
        request_type: protocol_to_type(metric.protocol),
        component_id: protocol_to_component(metric.protocol),
        detect_point: map_detect_point(metric.detect_point),
    }
}

fn to_service_instance_relation(
    metric: &ServiceMeshMetric,
    time_bucket: i64,
) -> ServiceInstanceRelation {
    ServiceInstanceRelation {
        time_bucket,
        source_service_name: metric.source_service_name.clone(),
        source_service_node_type: NodeType::Normal,
        source_service_instance_name: metric.source_service_instance.clone(),
        dest_service_name: metric.dest_service_name.clone(),
        dest_service_node_type: NodeType::Normal,
        dest_service_instance_name: metric.dest_service_instance.clone(),
        endpoint: metric.endpoint.clone(),
        latency: metric.latency,
        status: metric.status,
        response_code: metric.response_code,
        request_type: protocol_to_type(metric.protocol),
        component_id: protocol_to_component(metric.protocol),
        detect_point: map_detect_point(metric.detect_point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receivers::MemoryReceiver;
    use contracts::{ContractError, DetectPoint, Protocol, RequestType, TimerStart};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingTimer {
        started: AtomicU64,
        finished: AtomicU64,
    }

    impl LatencyTimer for CountingTimer {
        fn start(&self) -> TimerStart {
            self.started.fetch_add(1, Ordering::SeqCst);
            TimerStart::now()
        }

        fn finish(&self, _started: TimerStart) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Accepts `accept` sources, then fails
    struct FlakyReceiver {
        accept: u64,
        seen: AtomicU64,
    }

    impl SourceReceiver for FlakyReceiver {
        fn name(&self) -> &str {
            "flaky"
        }

        fn receive(&self, _source: Source) -> Result<(), ContractError> {
            if self.seen.fetch_add(1, Ordering::SeqCst) >= self.accept {
                return Err(ContractError::receiver_write("flaky", "queue closed"));
            }
            Ok(())
        }
    }

    fn server_metric() -> ServiceMeshMetric {
        ServiceMeshMetric {
            start_time: 1_700_000_000_000,
            source_service_name: "frontend".to_string(),
            source_service_instance: "frontend-1".to_string(),
            dest_service_name: "catalog".to_string(),
            dest_service_instance: "catalog-2".to_string(),
            endpoint: "/items/{id}".to_string(),
            latency: 42,
            status: true,
            response_code: 200,
            protocol: Protocol::Http,
            detect_point: WireDetectPoint::Server,
        }
    }

    fn dispatcher_with(receiver: Arc<dyn SourceReceiver>) -> TelemetryDataDispatcher {
        TelemetryDataDispatcher::builder(receiver)
            .timer(Arc::new(CountingTimer::default()))
            .build()
    }

    fn kinds(sources: &[Source]) -> Vec<SourceKind> {
        sources.iter().map(Source::kind).collect()
    }

    #[test]
    fn test_server_report_emits_all_eight_in_order() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        let dispatcher = dispatcher_with(receiver.clone());

        let outcome = dispatcher.process(server_metric()).unwrap();
        let sources = receiver.take();

        assert_eq!(
            kinds(&sources),
            vec![
                SourceKind::ServiceInstanceUpdate,
                SourceKind::ServiceInstanceUpdate,
                SourceKind::All,
                SourceKind::Service,
                SourceKind::ServiceInstance,
                SourceKind::Endpoint,
                SourceKind::ServiceRelation,
                SourceKind::ServiceInstanceRelation,
            ]
        );
        assert_eq!(outcome.emitted, kinds(&sources));
        assert_eq!(outcome.time_bucket, 202311142213);
        assert!(sources.iter().all(|s| s.time_bucket() == 202311142213));
    }

    #[test]
    fn test_node_sources_use_destination_fields() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        dispatcher_with(receiver.clone())
            .process(server_metric())
            .unwrap();

        let sources = receiver.take();
        let Source::Service(service) = &sources[3] else {
            panic!("expected service source, got {:?}", sources[3]);
        };
        assert_eq!(service.name, "catalog");
        assert_eq!(service.service_instance_name, "catalog-2");
        assert_eq!(service.endpoint_name, "/items/{id}");
        assert_eq!(service.request_type, RequestType::Http);
        assert_eq!(service.node_type, NodeType::Normal);

        let Source::ServiceInstance(instance) = &sources[4] else {
            panic!("expected instance source, got {:?}", sources[4]);
        };
        assert_eq!(instance.name, "catalog-2");
        assert_eq!(instance.service_name, "catalog");

        let Source::Endpoint(endpoint) = &sources[5] else {
            panic!("expected endpoint source, got {:?}", sources[5]);
        };
        assert_eq!(endpoint.name, "/items/{id}");
        assert_eq!(endpoint.latency, 42);
        assert!(endpoint.status);
        assert_eq!(endpoint.response_code, 200);
    }

    #[test]
    fn test_relation_fields() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        dispatcher_with(receiver.clone())
            .process(server_metric())
            .unwrap();

        let sources = receiver.take();
        let Source::ServiceRelation(relation) = &sources[6] else {
            panic!("expected service relation, got {:?}", sources[6]);
        };
        assert_eq!(relation.source_service_name, "frontend");
        assert_eq!(relation.source_service_instance_name, "frontend-1");
        assert_eq!(relation.dest_service_name, "catalog");
        assert_eq!(relation.component_id, 49);
        assert_eq!(relation.detect_point, DetectPoint::Server);

        let Source::ServiceInstanceRelation(relation) = &sources[7] else {
            panic!("expected instance relation, got {:?}", sources[7]);
        };
        assert_eq!(relation.dest_service_instance_name, "catalog-2");
        assert_eq!(relation.request_type, RequestType::Http);
    }

    #[test]
    fn test_client_report_skips_node_sources() {
        for detect_point in [WireDetectPoint::Client, WireDetectPoint::Proxy] {
            let receiver = Arc::new(MemoryReceiver::new("mem"));
            let metric = ServiceMeshMetric {
                detect_point,
                protocol: Protocol::Grpc,
                ..server_metric()
            };
            let outcome = dispatcher_with(receiver.clone()).process(metric).unwrap();

            assert_eq!(outcome.emitted.len(), 4);
            assert!(!outcome.emitted.iter().any(|k| k.is_node()));

            let sources = receiver.take();
            let Source::ServiceRelation(relation) = &sources[2] else {
                panic!("expected service relation, got {:?}", sources[2]);
            };
            assert_eq!(relation.component_id, 23);
            assert_eq!(relation.detect_point, map_detect_point(detect_point));
        }
    }

    #[test]
    fn test_unspecified_detect_point_is_not_a_server_report() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        let metric = ServiceMeshMetric {
            detect_point: WireDetectPoint::Unrecognized,
            ..server_metric()
        };
        let outcome = dispatcher_with(receiver.clone()).process(metric).unwrap();

        assert!(!outcome.emitted.iter().any(|k| k.is_node()));
        let sources = receiver.take();
        let Source::ServiceRelation(relation) = &sources[2] else {
            panic!("expected service relation, got {:?}", sources[2]);
        };
        assert_eq!(relation.detect_point, DetectPoint::Server);
    }

    #[test]
    fn test_empty_source_service_skips_relations_and_source_heartbeat() {
        for detect_point in [WireDetectPoint::Server, WireDetectPoint::Client] {
            let receiver = Arc::new(MemoryReceiver::new("mem"));
            let metric = ServiceMeshMetric {
                source_service_name: String::new(),
                detect_point,
                ..server_metric()
            };
            let outcome = dispatcher_with(receiver.clone()).process(metric).unwrap();

            assert!(!outcome.emitted.iter().any(|k| k.is_relation()));
            let heartbeats: Vec<Source> = receiver
                .take()
                .into_iter()
                .filter(|s| s.kind() == SourceKind::ServiceInstanceUpdate)
                .collect();
            assert_eq!(heartbeats.len(), 1);
            let Source::ServiceInstanceUpdate(update) = &heartbeats[0] else {
                unreachable!();
            };
            assert_eq!(update.name, "catalog-2");
        }
    }

    #[test]
    fn test_empty_dest_instance_skips_dest_heartbeat_only() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        let metric = ServiceMeshMetric {
            dest_service_instance: String::new(),
            ..server_metric()
        };
        let outcome = dispatcher_with(receiver.clone()).process(metric).unwrap();

        // 1 heartbeat + 4 node + 2 relation
        assert_eq!(outcome.emitted.len(), 7);
        let sources = receiver.take();
        let Source::ServiceInstanceUpdate(update) = &sources[0] else {
            panic!("expected heartbeat first");
        };
        assert_eq!(update.name, "frontend-1");
    }

    #[test]
    fn test_empty_destination_still_gets_relations() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        let metric = ServiceMeshMetric {
            dest_service_name: String::new(),
            dest_service_instance: String::new(),
            detect_point: WireDetectPoint::Client,
            ..server_metric()
        };
        let outcome = dispatcher_with(receiver).process(metric).unwrap();

        assert_eq!(
            outcome.emitted,
            vec![
                SourceKind::ServiceInstanceUpdate,
                SourceKind::ServiceRelation,
                SourceKind::ServiceInstanceRelation,
            ]
        );
    }

    #[test]
    fn test_naming_rules_apply_to_every_source() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        let mut rules = EndpointNamingRules::new();
        rules.add_rule("catalog", "/items/{id}", r"/items/\d+").unwrap();
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone())
            .formatter(Arc::new(rules))
            .timer(Arc::new(CountingTimer::default()))
            .build();

        let metric = ServiceMeshMetric {
            endpoint: "/items/981".to_string(),
            ..server_metric()
        };
        let outcome = dispatcher.process(metric).unwrap();
        assert!(outcome.endpoint_renamed);

        for source in receiver.take() {
            let endpoint = match &source {
                Source::ServiceInstanceUpdate(_) => continue,
                Source::All(s) => &s.endpoint_name,
                Source::Service(s) => &s.endpoint_name,
                Source::ServiceInstance(s) => &s.endpoint_name,
                Source::Endpoint(s) => &s.name,
                Source::ServiceRelation(s) => &s.endpoint,
                Source::ServiceInstanceRelation(s) => &s.endpoint,
            };
            assert_eq!(endpoint, "/items/{id}");
        }
    }

    #[test]
    fn test_receiver_failure_propagates_and_finishes_timer() {
        let timer = Arc::new(CountingTimer::default());
        let receiver = Arc::new(FlakyReceiver {
            accept: 3,
            seen: AtomicU64::new(0),
        });
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone())
            .timer(timer.clone())
            .build();

        let result = dispatcher.process(server_metric());
        assert!(matches!(
            result,
            Err(DispatcherError::Receive {
                kind: SourceKind::Service,
                ..
            })
        ));
        // Nothing is forwarded after the failure
        assert_eq!(receiver.seen.load(Ordering::SeqCst), 4);
        assert_eq!(timer.started.load(Ordering::SeqCst), 1);
        assert_eq!(timer.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bucket_failure_emits_nothing() {
        let receiver = Arc::new(MemoryReceiver::new("mem"));
        let timer = Arc::new(CountingTimer::default());
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone())
            .timer(timer.clone())
            .build();

        let metric = ServiceMeshMetric {
            start_time: i64::MAX,
            ..server_metric()
        };
        let result = dispatcher.process(metric);

        assert!(matches!(
            result,
            Err(DispatcherError::Contract(ContractError::TimeBucket { .. }))
        ));
        assert!(receiver.is_empty());
        assert_eq!(timer.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_timer_measures_each_process_call() {
        let timer = Arc::new(CountingTimer::default());
        let dispatcher = TelemetryDataDispatcher::builder(Arc::new(MemoryReceiver::new("mem")))
            .timer(timer.clone())
            .build();

        for _ in 0..3 {
            dispatcher.process(server_metric()).unwrap();
        }
        assert_eq!(timer.started.load(Ordering::SeqCst), 3);
        assert_eq!(timer.finished.load(Ordering::SeqCst), 3);
    }
}
